//! Policy manager: store delegation plus the read-side normalization pass.
//!
//! The manager owns no state besides its store, so one instance can be shared
//! (e.g. behind an `Arc`) by any number of concurrent callers. Construct it
//! once with [`PolicyManager::new`] and hand it to the consumers that need it.

use serde_json::Value;

use crate::error::CoreError;
use crate::policy_store::{PolicyStore, StoreError};
use crate::preheat_policy::{parse_policy, PolicyField, Schema};
use crate::query::{Query, KEYWORD_PROJECT_ID};
use crate::types::DbId;

/// Manages preheat policies on top of a [`PolicyStore`].
#[derive(Debug, Clone)]
pub struct PolicyManager<S> {
    store: S,
}

impl<S: PolicyStore> PolicyManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Total number of policies matching `query`.
    pub async fn count(&self, query: &Query) -> Result<i64, CoreError> {
        self.store.count(query).await.map_err(store_error("count"))
    }

    /// Persist a new policy and return its id.
    ///
    /// `filters_raw` / `trigger_raw` are stored as given; malformed text is
    /// only detected when the policy is read back.
    pub async fn create(&self, schema: &Schema) -> Result<DbId, CoreError> {
        self.store.create(schema).await.map_err(store_error("create"))
    }

    /// Update the listed `props` of the policy `schema.id`.
    ///
    /// With an empty `props` every mutable column is overwritten.
    pub async fn update(&self, schema: &Schema, props: &[PolicyField]) -> Result<(), CoreError> {
        self.store
            .update(schema, props)
            .await
            .map_err(store_error("update"))
    }

    /// Fetch a policy by id with its filters and trigger decoded.
    pub async fn get(&self, id: DbId) -> Result<Schema, CoreError> {
        let schema = self.store.get(id).await.map_err(store_error("get"))?;
        parse_policy(Some(schema))
    }

    /// Fetch a policy by its name within a project.
    pub async fn get_by_name(&self, project_id: DbId, name: &str) -> Result<Schema, CoreError> {
        let schema = self
            .store
            .get_by_name(project_id, name)
            .await
            .map_err(store_error("get_by_name"))?;
        parse_policy(Some(schema))
    }

    pub async fn delete(&self, id: DbId) -> Result<(), CoreError> {
        self.store.delete(id).await.map_err(store_error("delete"))
    }

    /// List one page of policies, each normalized.
    ///
    /// Fails as a whole on the first policy that cannot be normalized.
    pub async fn list_policies(&self, query: &Query) -> Result<Vec<Schema>, CoreError> {
        let schemas = self
            .store
            .list(query)
            .await
            .map_err(store_error("list_policies"))?;

        let mut parsed = Vec::with_capacity(schemas.len());
        for schema in schemas {
            let id = schema.id;
            match parse_policy(Some(schema)) {
                Ok(schema) => parsed.push(schema),
                Err(e) => {
                    tracing::warn!(policy_id = id, error = %e, "Preheat policy failed to normalize");
                    return Err(e);
                }
            }
        }

        tracing::debug!(count = parsed.len(), "Listed preheat policies");
        Ok(parsed)
    }

    /// List policies of one project.
    ///
    /// Inserts `project_id` into the query keywords (replacing any previous
    /// value) before delegating to [`Self::list_policies`]. The caller's
    /// query is modified in place; pass `None` to use a default query.
    pub async fn list_policies_by_project(
        &self,
        project_id: DbId,
        query: Option<&mut Query>,
    ) -> Result<Vec<Schema>, CoreError> {
        let mut default_query = Query::default();
        let query = query.unwrap_or(&mut default_query);
        query
            .keywords
            .insert(KEYWORD_PROJECT_ID.to_string(), Value::from(project_id));

        self.list_policies(query).await
    }
}

/// Map a store failure to a [`CoreError`], tagging backend errors with the
/// manager operation.
fn store_error(operation: &'static str) -> impl FnOnce(StoreError) -> CoreError {
    move |err| match err {
        StoreError::NotFound(msg) => CoreError::NotFound(msg),
        StoreError::Conflict(msg) => CoreError::Conflict(msg),
        StoreError::Backend(source) => CoreError::Store { operation, source },
    }
}
