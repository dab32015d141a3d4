//! In-memory [`PolicyStore`] used by the manager tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use preheat_core::policy_store::{PolicyStore, StoreError};
use preheat_core::preheat_policy::{PolicyField, Schema};
use preheat_core::query::Query;
use preheat_core::types::DbId;

#[derive(Default)]
struct Inner {
    next_id: DbId,
    rows: BTreeMap<DbId, Schema>,
    queries: Vec<Query>,
}

/// Stores policies in a map keyed by id. Keywords are matched against the
/// serialized record, so any top-level column name works as a filter.
#[derive(Default)]
pub struct InMemoryPolicyStore {
    inner: Mutex<Inner>,
    broken: bool,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails with a backend error.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    /// Queries seen by `count` and `list`, in call order.
    pub fn seen_queries(&self) -> Vec<Query> {
        self.inner.lock().unwrap().queries.clone()
    }

    /// Raw stored record, bypassing normalization.
    pub fn raw(&self, id: DbId) -> Option<Schema> {
        self.inner.lock().unwrap().rows.get(&id).cloned()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.broken {
            Err(StoreError::Backend("connection refused".into()))
        } else {
            Ok(())
        }
    }

    fn matching(inner: &Inner, query: &Query) -> Vec<Schema> {
        inner
            .rows
            .values()
            .filter(|schema| {
                let record = serde_json::to_value(schema).unwrap();
                query
                    .keywords
                    .iter()
                    .all(|(key, value)| record.get(key) == Some(value))
            })
            .cloned()
            .collect()
    }
}

fn not_found(what: impl std::fmt::Display) -> StoreError {
    StoreError::NotFound(format!("preheat policy {what} not found"))
}

impl PolicyStore for InMemoryPolicyStore {
    async fn count(&self, query: &Query) -> Result<i64, StoreError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.queries.push(query.clone());
        Ok(Self::matching(&inner, query).len() as i64)
    }

    async fn create(&self, schema: &Schema) -> Result<DbId, StoreError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        let duplicate = inner
            .rows
            .values()
            .any(|s| s.project_id == schema.project_id && s.name == schema.name);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "policy {} already exists under the project {}",
                schema.name, schema.project_id
            )));
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let mut row = schema.clone();
        row.id = id;
        row.filters.clear();
        row.trigger = None;
        inner.rows.insert(id, row);
        Ok(id)
    }

    async fn update(&self, schema: &Schema, fields: &[PolicyField]) -> Result<(), StoreError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        let row = inner.rows.get_mut(&schema.id).ok_or_else(|| not_found(schema.id))?;
        let fields = if fields.is_empty() { PolicyField::ALL } else { fields };
        for field in fields {
            match field {
                PolicyField::Name => row.name = schema.name.clone(),
                PolicyField::Description => row.description = schema.description.clone(),
                PolicyField::ProjectId => row.project_id = schema.project_id,
                PolicyField::ProviderId => row.provider_id = schema.provider_id,
                PolicyField::Filters => row.filters_raw = schema.filters_raw.clone(),
                PolicyField::Trigger => row.trigger_raw = schema.trigger_raw.clone(),
                PolicyField::Enabled => row.enabled = schema.enabled,
                PolicyField::Scope => row.scope = schema.scope.clone(),
                PolicyField::ExtraAttrs => row.extra_attrs_raw = schema.extra_attrs_raw.clone(),
            }
        }
        Ok(())
    }

    async fn get(&self, id: DbId) -> Result<Schema, StoreError> {
        self.check()?;
        self.raw(id).ok_or_else(|| not_found(id))
    }

    async fn get_by_name(&self, project_id: DbId, name: &str) -> Result<Schema, StoreError> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        inner
            .rows
            .values()
            .find(|s| s.project_id == project_id && s.name == name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    async fn delete(&self, id: DbId) -> Result<(), StoreError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.rows.remove(&id).map(|_| ()).ok_or_else(|| not_found(id))
    }

    async fn list(&self, query: &Query) -> Result<Vec<Schema>, StoreError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.queries.push(query.clone());
        let rows = Self::matching(&inner, query);
        if query.page_size <= 0 {
            return Ok(rows);
        }
        let skip = (query.page_number.max(1) - 1).saturating_mul(query.page_size) as usize;
        Ok(rows
            .into_iter()
            .skip(skip)
            .take(query.page_size as usize)
            .collect())
    }
}
