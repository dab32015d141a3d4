//! Structural validation of a policy before it is persisted.

use serde_json::Value;

use super::model::{Filter, FilterType, Schema, TriggerType};
use crate::error::CoreError;

/// Maximum length for a policy name.
pub const MAX_POLICY_NAME_LEN: usize = 255;

/// Scheduled triggers use six-field cron expressions (seconds first).
pub const CRON_FIELD_COUNT: usize = 6;

impl Schema {
    /// Check name, project and the structured filter/trigger view.
    ///
    /// Operates on `filters` / `trigger`, so call it before
    /// [`Schema::encode`] on the write path, or after parsing on the read path.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.is_empty() {
            return Err(CoreError::Validation(
                "Policy name must not be empty".to_string(),
            ));
        }
        if self.name.len() > MAX_POLICY_NAME_LEN {
            return Err(CoreError::Validation(format!(
                "Policy name too long: {} chars (max {MAX_POLICY_NAME_LEN})",
                self.name.len()
            )));
        }
        if self.project_id <= 0 {
            return Err(CoreError::Validation(format!(
                "Policy project_id must be positive, got {}",
                self.project_id
            )));
        }

        for filter in &self.filters {
            validate_filter(filter)?;
        }

        if let Some(trigger) = &self.trigger {
            if trigger.trigger_type == TriggerType::Scheduled
                && !trigger.trigger_setting.cron.is_empty()
            {
                validate_cron(&trigger.trigger_setting.cron)?;
            }
        }

        Ok(())
    }
}

fn validate_filter(filter: &Filter) -> Result<(), CoreError> {
    let valid = match filter.filter_type {
        FilterType::Repository | FilterType::Tag => filter.value.is_string(),
        FilterType::Vulnerability => filter.value.is_string() || filter.value.is_i64(),
        FilterType::Signature => filter.value.is_boolean(),
        FilterType::Label => match &filter.value {
            Value::Array(labels) => labels.iter().all(Value::is_string),
            _ => false,
        },
        FilterType::Other(_) => true,
    };

    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid value for '{}' filter: {}",
            filter.filter_type, filter.value
        )))
    }
}

/// Validate the shape of a six-field cron expression.
///
/// Only the field count and the character set are checked; range checks are
/// left to the scheduler that consumes the expression.
pub fn validate_cron(cron: &str) -> Result<(), CoreError> {
    let fields: Vec<&str> = cron.split_whitespace().collect();
    if fields.len() != CRON_FIELD_COUNT {
        return Err(CoreError::Validation(format!(
            "Cron expression must have {CRON_FIELD_COUNT} fields, got {}: '{cron}'",
            fields.len()
        )));
    }

    if let Some(field) = fields.iter().find(|f| !f.chars().all(is_cron_char)) {
        return Err(CoreError::Validation(format!(
            "Invalid cron field '{field}' in '{cron}'"
        )));
    }

    Ok(())
}

fn is_cron_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '*' | '/' | ',' | '-' | '?')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
