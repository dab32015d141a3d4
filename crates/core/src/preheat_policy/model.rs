use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/* --------------------------------------------------------------------------
   Filters
   -------------------------------------------------------------------------- */

/// Discriminator of a [`Filter`].
///
/// Unrecognised type strings are kept verbatim in [`FilterType::Other`] so
/// that decoding and re-encoding a filter list does not lose data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterType {
    Repository,
    Tag,
    Label,
    Signature,
    Vulnerability,
    Other(String),
}

impl FilterType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Repository => "repository",
            Self::Tag => "tag",
            Self::Label => "label",
            Self::Signature => "signature",
            Self::Vulnerability => "vulnerability",
            Self::Other(other) => other.as_str(),
        }
    }
}

impl From<String> for FilterType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "repository" => Self::Repository,
            "tag" => Self::Tag,
            "label" => Self::Label,
            "signature" => Self::Signature,
            "vulnerability" => Self::Vulnerability,
            _ => Self::Other(value),
        }
    }
}

impl From<FilterType> for String {
    fn from(value: FilterType) -> Self {
        match value {
            FilterType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single predicate narrowing which artifacts a policy applies to.
///
/// `value` is shaped by `filter_type`: a pattern string for repository and
/// tag, a label list, a bool for signature, and an integer severity for
/// vulnerability (after normalization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    #[serde(default)]
    pub value: Value,
}

impl Filter {
    pub fn new(filter_type: FilterType, value: impl Into<Value>) -> Self {
        Self {
            filter_type,
            value: value.into(),
        }
    }
}

/* --------------------------------------------------------------------------
   Trigger
   -------------------------------------------------------------------------- */

/// How a policy is activated.
///
/// Unrecognised type strings are kept verbatim in [`TriggerType::Other`];
/// the trigger shape is not interpreted beyond decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TriggerType {
    Manual,
    Scheduled,
    EventBased,
    Other(String),
}

impl TriggerType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Manual => "manual",
            Self::Scheduled => "scheduled",
            Self::EventBased => "event_based",
            Self::Other(other) => other.as_str(),
        }
    }
}

impl From<String> for TriggerType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "manual" => Self::Manual,
            "scheduled" => Self::Scheduled,
            "event_based" => Self::EventBased,
            _ => Self::Other(value),
        }
    }
}

impl From<TriggerType> for String {
    fn from(value: TriggerType) -> Self {
        match value {
            TriggerType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSetting {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub cron: String,
}

impl TriggerSetting {
    pub fn is_empty(&self) -> bool {
        self.cron.is_empty()
    }
}

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Activation condition of a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "TriggerSetting::is_empty"
    )]
    pub trigger_setting: TriggerSetting,
}

impl Trigger {
    pub fn manual() -> Self {
        Self {
            trigger_type: TriggerType::Manual,
            trigger_setting: TriggerSetting::default(),
        }
    }

    pub fn scheduled(cron: impl Into<String>) -> Self {
        Self {
            trigger_type: TriggerType::Scheduled,
            trigger_setting: TriggerSetting { cron: cron.into() },
        }
    }
}

/* --------------------------------------------------------------------------
   Schema
   -------------------------------------------------------------------------- */

/// A preheat policy record.
///
/// The `*_raw` fields are the durable source of truth. `filters` and
/// `trigger` are derived on read and skipped by serde so they never reach
/// the store or the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub id: DbId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub project_id: DbId,
    #[serde(default)]
    pub provider_id: DbId,
    #[serde(rename = "filters", default)]
    pub filters_raw: String,
    #[serde(skip)]
    pub filters: Vec<Filter>,
    #[serde(rename = "trigger", default)]
    pub trigger_raw: String,
    #[serde(skip)]
    pub trigger: Option<Trigger>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub scope: String,
    #[serde(rename = "extra_attrs", default)]
    pub extra_attrs_raw: String,
    #[serde(default)]
    pub creation_time: Option<Timestamp>,
    #[serde(default)]
    pub update_time: Option<Timestamp>,
}

impl Schema {
    /// Serialize `filters` and `trigger` into their raw text columns.
    ///
    /// An empty filter list and an absent trigger encode to empty strings,
    /// which [`super::parse_policy`] reads back as empty/absent.
    pub fn encode(&mut self) -> Result<(), CoreError> {
        self.filters_raw = if self.filters.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&self.filters)
                .map_err(|e| CoreError::malformed("encode filters", e))?
        };

        self.trigger_raw = match &self.trigger {
            Some(trigger) => serde_json::to_string(trigger)
                .map_err(|e| CoreError::malformed("encode trigger", e))?,
            None => String::new(),
        };

        Ok(())
    }
}

/* --------------------------------------------------------------------------
   Update fields
   -------------------------------------------------------------------------- */

/// A persisted, caller-mutable column of a policy.
///
/// Passed to partial updates to select which columns are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyField {
    Name,
    Description,
    ProjectId,
    ProviderId,
    Filters,
    Trigger,
    Enabled,
    Scope,
    ExtraAttrs,
}

impl PolicyField {
    /// Every mutable column; used when an update names no fields.
    pub const ALL: &'static [PolicyField] = &[
        PolicyField::Name,
        PolicyField::Description,
        PolicyField::ProjectId,
        PolicyField::ProviderId,
        PolicyField::Filters,
        PolicyField::Trigger,
        PolicyField::Enabled,
        PolicyField::Scope,
        PolicyField::ExtraAttrs,
    ];

    /// Column name in the `p2p_preheat_policy` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::ProjectId => "project_id",
            Self::ProviderId => "provider_id",
            Self::Filters => "filters",
            Self::Trigger => "trigger",
            Self::Enabled => "enabled",
            Self::Scope => "scope",
            Self::ExtraAttrs => "extra_attrs",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
