//! Row model for the `p2p_preheat_policy` table.

use preheat_core::preheat_policy::Schema;
use preheat_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `p2p_preheat_policy` table.
///
/// `filters`, `trigger` and `extra_attrs` hold the raw JSON text exactly as
/// it was written.
#[derive(Debug, Clone, FromRow)]
pub struct PreheatPolicyRow {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub project_id: DbId,
    pub provider_id: DbId,
    pub filters: String,
    pub trigger: String,
    pub enabled: bool,
    pub scope: String,
    pub extra_attrs: String,
    pub creation_time: Timestamp,
    pub update_time: Timestamp,
}

impl From<PreheatPolicyRow> for Schema {
    fn from(row: PreheatPolicyRow) -> Self {
        Schema {
            id: row.id,
            name: row.name,
            description: row.description,
            project_id: row.project_id,
            provider_id: row.provider_id,
            filters_raw: row.filters,
            filters: Vec::new(),
            trigger_raw: row.trigger,
            trigger: None,
            enabled: row.enabled,
            scope: row.scope,
            extra_attrs_raw: row.extra_attrs,
            creation_time: Some(row.creation_time),
            update_time: Some(row.update_time),
        }
    }
}
