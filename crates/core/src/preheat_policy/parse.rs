//! Normalization pass run on every policy read.

use serde_json::Value;

use super::model::{Filter, FilterType, Schema, Trigger};
use crate::error::CoreError;

/// Rebuild the structured `filters` / `trigger` view of a stored policy.
///
/// `None` is rejected with [`CoreError::InvalidInput`]. Decode and
/// severity-parse failures surface as [`CoreError::Malformed`]; nothing is
/// retried.
pub fn parse_policy(schema: Option<Schema>) -> Result<Schema, CoreError> {
    let mut schema = schema
        .ok_or_else(|| CoreError::InvalidInput("policy schema can not be nil".to_string()))?;

    schema.filters = parse_filters(&schema.filters_raw)?;
    schema.trigger = parse_trigger(&schema.trigger_raw)?;

    Ok(schema)
}

/// Decode a raw filter list. Empty text (or JSON `null`) yields no filters.
pub fn parse_filters(raw: &str) -> Result<Vec<Filter>, CoreError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let mut filters: Vec<Filter> = serde_json::from_str::<Option<Vec<Filter>>>(raw)
        .map_err(|e| CoreError::malformed("decode filters", e))?
        .unwrap_or_default();

    // Older UI builds send the severity as "5" or 5.0. Remove this pass once
    // every producer writes integers; it is deliberately limited to
    // vulnerability filters.
    for filter in filters
        .iter_mut()
        .filter(|f| f.filter_type == FilterType::Vulnerability)
    {
        if let Some(severity) = coerce_severity(&filter.value)? {
            filter.value = Value::from(severity);
        }
    }

    Ok(filters)
}

/// Decode a raw trigger. Empty text (or JSON `null`) yields no trigger.
pub fn parse_trigger(raw: &str) -> Result<Option<Trigger>, CoreError> {
    if raw.is_empty() {
        return Ok(None);
    }

    serde_json::from_str::<Option<Trigger>>(raw).map_err(|e| CoreError::malformed("decode trigger", e))
}

/// Integer severity for a string or float value, `None` when the value is
/// left as is.
fn coerce_severity(value: &Value) -> Result<Option<i64>, CoreError> {
    match value {
        Value::String(text) => severity_from_str(text).map(Some),
        Value::Number(number) if number.is_f64() => Ok(number.as_f64().map(severity_from_f64)),
        _ => Ok(None),
    }
}

fn severity_from_str(text: &str) -> Result<i64, CoreError> {
    text.parse::<i32>()
        .map(i64::from)
        .map_err(|e| CoreError::malformed("parse filters", e))
}

/// Truncates toward zero.
fn severity_from_f64(value: f64) -> i64 {
    value.trunc() as i64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
