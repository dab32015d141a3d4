//! Preheat policy records and their serialization boundary.
//!
//! A policy persists its filters and trigger as opaque JSON text
//! (`filters_raw`, `trigger_raw`). The structured `filters` / `trigger`
//! fields are a read-side view rebuilt by [`parse_policy`] on every read and
//! never written back.

mod model;
mod parse;
mod validate;

pub use model::{Filter, FilterType, PolicyField, Schema, Trigger, TriggerSetting, TriggerType};
pub use parse::{parse_filters, parse_policy, parse_trigger};
pub use validate::{validate_cron, CRON_FIELD_COUNT, MAX_POLICY_NAME_LEN};
