//! Postgres-backed [`PolicyStore`].

use preheat_core::policy_store::{PolicyStore, StoreError};
use preheat_core::preheat_policy::{PolicyField, Schema};
use preheat_core::query::Query;
use preheat_core::types::DbId;
use sqlx::PgPool;

use crate::repositories::{PolicyQueryError, PreheatPolicyRepo};

/// PostgreSQL error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// [`PolicyStore`] over the `p2p_preheat_policy` table.
///
/// Cheaply cloneable; clones share the same pool.
#[derive(Debug, Clone)]
pub struct PgPolicyStore {
    pool: PgPool,
}

impl PgPolicyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl PolicyStore for PgPolicyStore {
    async fn count(&self, query: &Query) -> Result<i64, StoreError> {
        PreheatPolicyRepo::count(&self.pool, query)
            .await
            .map_err(from_query_error)
    }

    async fn create(&self, schema: &Schema) -> Result<DbId, StoreError> {
        PreheatPolicyRepo::create(&self.pool, schema)
            .await
            .map_err(|e| match from_sqlx_error(e) {
                StoreError::Conflict(_) => StoreError::Conflict(format!(
                    "policy {} already exists under the project {}",
                    schema.name, schema.project_id
                )),
                other => other,
            })
    }

    async fn update(&self, schema: &Schema, fields: &[PolicyField]) -> Result<(), StoreError> {
        let updated = PreheatPolicyRepo::update(&self.pool, schema, fields)
            .await
            .map_err(from_sqlx_error)?;
        if updated {
            Ok(())
        } else {
            Err(not_found(schema.id))
        }
    }

    async fn get(&self, id: DbId) -> Result<Schema, StoreError> {
        PreheatPolicyRepo::find_by_id(&self.pool, id)
            .await
            .map_err(from_sqlx_error)?
            .map(Schema::from)
            .ok_or_else(|| not_found(id))
    }

    async fn get_by_name(&self, project_id: DbId, name: &str) -> Result<Schema, StoreError> {
        PreheatPolicyRepo::find_by_name(&self.pool, project_id, name)
            .await
            .map_err(from_sqlx_error)?
            .map(Schema::from)
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "preheat policy {name} not found under the project {project_id}"
                ))
            })
    }

    async fn delete(&self, id: DbId) -> Result<(), StoreError> {
        let deleted = PreheatPolicyRepo::delete(&self.pool, id)
            .await
            .map_err(from_sqlx_error)?;
        if deleted {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    async fn list(&self, query: &Query) -> Result<Vec<Schema>, StoreError> {
        let rows = PreheatPolicyRepo::list(&self.pool, query)
            .await
            .map_err(from_query_error)?;
        Ok(rows.into_iter().map(Schema::from).collect())
    }
}

fn not_found(id: DbId) -> StoreError {
    StoreError::NotFound(format!("preheat policy {id} not found"))
}

/// Classify a sqlx error.
///
/// - `RowNotFound` maps to `NotFound`.
/// - Unique constraint violations map to `Conflict`.
/// - Everything else is passed through as `Backend`.
fn from_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound("preheat policy not found".to_string()),
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            StoreError::Conflict(format!(
                "Duplicate value violates unique constraint: {constraint}"
            ))
        }
        other => {
            tracing::error!(error = %other, "Preheat policy database error");
            StoreError::Backend(Box::new(other))
        }
    }
}

fn from_query_error(err: PolicyQueryError) -> StoreError {
    match err {
        PolicyQueryError::Database(e) => from_sqlx_error(e),
        other => StoreError::Backend(Box::new(other)),
    }
}
