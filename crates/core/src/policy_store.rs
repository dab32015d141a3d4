//! Persistence contract consumed by [`crate::policy_manager::PolicyManager`].
//!
//! Implementations live outside this crate (`preheat-db` provides the
//! Postgres one). Cancellation follows the usual async convention: dropping
//! a returned future abandons the in-flight operation.

use std::future::Future;

use crate::preheat_policy::{PolicyField, Schema};
use crate::query::Query;
use crate::types::DbId;

/// Failure reported by a [`PolicyStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record matched the id or name.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness constraint was violated (e.g. duplicate name in a project).
    #[error("{0}")]
    Conflict(String),

    /// Any other backend failure.
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// CRUD and query backend for preheat policy records.
///
/// Stores persist `filters_raw` / `trigger_raw` verbatim and never look at
/// the derived `filters` / `trigger` fields.
pub trait PolicyStore: Send + Sync {
    /// Number of records matching the query's keywords.
    fn count(&self, query: &Query) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Insert a record and return its assigned id.
    fn create(&self, schema: &Schema) -> impl Future<Output = Result<DbId, StoreError>> + Send;

    /// Persist `fields` of the record identified by `schema.id`.
    ///
    /// An empty `fields` slice means a full update: every column listed in
    /// [`PolicyField::ALL`] is written.
    fn update(
        &self,
        schema: &Schema,
        fields: &[PolicyField],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get(&self, id: DbId) -> impl Future<Output = Result<Schema, StoreError>> + Send;

    fn get_by_name(
        &self,
        project_id: DbId,
        name: &str,
    ) -> impl Future<Output = Result<Schema, StoreError>> + Send;

    fn delete(&self, id: DbId) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// One page of records matching the query.
    fn list(&self, query: &Query) -> impl Future<Output = Result<Vec<Schema>, StoreError>> + Send;
}
