//! Repository for the `p2p_preheat_policy` table.

use preheat_core::preheat_policy::{PolicyField, Schema};
use preheat_core::query::Query;
use preheat_core::types::DbId;
use serde_json::Value;
use sqlx::PgPool;

use crate::models::preheat_policy::PreheatPolicyRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, project_id, provider_id, filters, \"trigger\", \
    enabled, scope, extra_attrs, creation_time, update_time";

/// Upper bound on `page_size` for paginated listing.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Columns that may appear as query keywords, with their SQL type.
const FILTERABLE_COLUMNS: &[(&str, ColumnKind)] = &[
    ("id", ColumnKind::BigInt),
    ("name", ColumnKind::Text),
    ("project_id", ColumnKind::BigInt),
    ("provider_id", ColumnKind::BigInt),
    ("enabled", ColumnKind::Bool),
    ("scope", ColumnKind::Text),
];

/// Columns accepted as sort keys.
const SORTABLE_COLUMNS: &[&str] = &[
    "id",
    "name",
    "project_id",
    "provider_id",
    "enabled",
    "creation_time",
    "update_time",
];

/// Failure while listing or counting with a caller-supplied [`Query`].
#[derive(Debug, thiserror::Error)]
pub enum PolicyQueryError {
    #[error("Unsupported value for keyword '{key}': expected {expected}, got {value}")]
    UnsupportedKeyword {
        key: String,
        expected: &'static str,
        value: Value,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Provides CRUD and query operations for preheat policies.
pub struct PreheatPolicyRepo;

impl PreheatPolicyRepo {
    /// Insert a new policy and return its id. Raw text columns are stored
    /// verbatim.
    pub async fn create(pool: &PgPool, schema: &Schema) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO p2p_preheat_policy
                (name, description, project_id, provider_id, filters, \"trigger\",
                 enabled, scope, extra_attrs)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id",
        )
        .bind(&schema.name)
        .bind(&schema.description)
        .bind(schema.project_id)
        .bind(schema.provider_id)
        .bind(&schema.filters_raw)
        .bind(&schema.trigger_raw)
        .bind(schema.enabled)
        .bind(&schema.scope)
        .bind(&schema.extra_attrs_raw)
        .fetch_one(pool)
        .await
    }

    /// Find a policy by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PreheatPolicyRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM p2p_preheat_policy WHERE id = $1");
        sqlx::query_as::<_, PreheatPolicyRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a policy by name within a project.
    pub async fn find_by_name(
        pool: &PgPool,
        project_id: DbId,
        name: &str,
    ) -> Result<Option<PreheatPolicyRow>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM p2p_preheat_policy WHERE project_id = $1 AND name = $2");
        sqlx::query_as::<_, PreheatPolicyRow>(&query)
            .bind(project_id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Write `fields` of policy `schema.id`; an empty slice writes every
    /// mutable column. `update_time` is always refreshed.
    ///
    /// Returns `true` if a row was updated.
    pub async fn update(
        pool: &PgPool,
        schema: &Schema,
        fields: &[PolicyField],
    ) -> Result<bool, sqlx::Error> {
        let (sets, bind_values) = build_update_sets(schema, fields);

        let query = format!(
            "UPDATE p2p_preheat_policy SET {}, update_time = NOW() WHERE id = $1 RETURNING id",
            sets.join(", ")
        );

        let q = sqlx::query_scalar::<_, DbId>(&query).bind(schema.id);
        let updated = bind_scalar_values(q, &bind_values)
            .fetch_optional(pool)
            .await?;
        Ok(updated.is_some())
    }

    /// Delete a policy. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM p2p_preheat_policy WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List policies matching the query keywords, sorted and paginated.
    pub async fn list(
        pool: &PgPool,
        query: &Query,
    ) -> Result<Vec<PreheatPolicyRow>, PolicyQueryError> {
        let (where_clause, mut bind_values, bind_idx) = build_policy_filter(query)?;
        let order_by = build_order_by(query);

        let mut sql = format!("SELECT {COLUMNS} FROM p2p_preheat_policy {where_clause} {order_by}");
        if let Some((limit, offset)) = page_bounds(query) {
            sql.push_str(&format!(" LIMIT ${bind_idx} OFFSET ${}", bind_idx + 1));
            bind_values.push(BindValue::BigInt(limit));
            bind_values.push(BindValue::BigInt(offset));
        }

        let q = bind_row_values(sqlx::query_as::<_, PreheatPolicyRow>(&sql), &bind_values);
        Ok(q.fetch_all(pool).await?)
    }

    /// Count policies matching the query keywords (pagination is ignored).
    pub async fn count(pool: &PgPool, query: &Query) -> Result<i64, PolicyQueryError> {
        let (where_clause, bind_values, _) = build_policy_filter(query)?;

        let sql = format!("SELECT COUNT(*)::BIGINT AS count FROM p2p_preheat_policy {where_clause}");

        let q = bind_scalar_values(sqlx::query_scalar::<_, i64>(&sql), &bind_values);
        Ok(q.fetch_one(pool).await?)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// SQL type of a filterable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    BigInt,
    Text,
    Bool,
}

impl ColumnKind {
    fn expected(self) -> &'static str {
        match self {
            Self::BigInt => "an integer",
            Self::Text => "a string",
            Self::Bool => "a boolean",
        }
    }
}

/// Typed bind value for dynamically-built policy queries.
#[derive(Debug, Clone, PartialEq)]
enum BindValue {
    BigInt(i64),
    Text(String),
    Bool(bool),
}

/// Build a WHERE clause and bind values from the query keywords.
///
/// Returns `(where_clause, bind_values, next_bind_index)`. Keys that are not
/// filterable columns are skipped. A string starting with `~` on a text
/// column becomes a case-insensitive substring match.
fn build_policy_filter(query: &Query) -> Result<(String, Vec<BindValue>, u32), PolicyQueryError> {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    // Sorted so identical queries produce identical SQL.
    let mut keys: Vec<&String> = query.keywords.keys().collect();
    keys.sort();

    for key in keys {
        let value = &query.keywords[key];
        let Some(&(column, kind)) = FILTERABLE_COLUMNS
            .iter()
            .find(|(column, _)| *column == key.as_str())
        else {
            tracing::warn!(keyword = %key, "Ignoring unknown preheat policy keyword");
            continue;
        };

        let (condition, bind) = match (kind, value) {
            (ColumnKind::BigInt, Value::Number(n)) if n.is_i64() => (
                format!("{column} = ${bind_idx}"),
                BindValue::BigInt(n.as_i64().unwrap_or_default()),
            ),
            (ColumnKind::Text, Value::String(s)) => match s.strip_prefix('~') {
                Some(fuzzy) => (
                    format!("{column} ILIKE ${bind_idx} ESCAPE '\\'"),
                    BindValue::Text(format!("%{}%", escape_like(fuzzy))),
                ),
                None => (format!("{column} = ${bind_idx}"), BindValue::Text(s.clone())),
            },
            (ColumnKind::Bool, Value::Bool(b)) => {
                (format!("{column} = ${bind_idx}"), BindValue::Bool(*b))
            }
            _ => {
                return Err(PolicyQueryError::UnsupportedKeyword {
                    key: key.clone(),
                    expected: kind.expected(),
                    value: value.clone(),
                })
            }
        };

        conditions.push(condition);
        bind_values.push(bind);
        bind_idx += 1;
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    Ok((where_clause, bind_values, bind_idx))
}

/// Escape `LIKE` wildcards so user text only matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Build the ORDER BY clause. Unknown sort keys are skipped; `id` is always
/// the final tiebreaker.
fn build_order_by(query: &Query) -> String {
    let mut parts: Vec<String> = Vec::new();
    for sort in &query.sorts {
        if !SORTABLE_COLUMNS.contains(&sort.key.as_str()) {
            tracing::warn!(sort_key = %sort.key, "Ignoring unknown preheat policy sort key");
            continue;
        }
        let direction = if sort.desc { "DESC" } else { "ASC" };
        parts.push(format!("{} {direction}", sort.key));
    }
    if !query.sorts.iter().any(|s| s.key == "id") {
        parts.push("id ASC".to_string());
    }
    format!("ORDER BY {}", parts.join(", "))
}

/// `(limit, offset)` for a paginated query, `None` when `page_size` is not
/// positive.
fn page_bounds(query: &Query) -> Option<(i64, i64)> {
    if query.page_size <= 0 {
        return None;
    }
    let limit = query.page_size.min(MAX_PAGE_SIZE);
    let offset = (query.page_number.max(1) - 1).saturating_mul(limit);
    Some((limit, offset))
}

/// Build the SET assignments for an update. `$1` is reserved for the id.
fn build_update_sets(schema: &Schema, fields: &[PolicyField]) -> (Vec<String>, Vec<BindValue>) {
    let fields = if fields.is_empty() {
        PolicyField::ALL
    } else {
        fields
    };

    let mut sets: Vec<String> = Vec::new();
    let mut bind_values: Vec<BindValue> = Vec::new();
    let mut written: Vec<PolicyField> = Vec::new();
    let mut bind_idx = 2u32;

    for &field in fields {
        if written.contains(&field) {
            continue;
        }
        written.push(field);

        let value = match field {
            PolicyField::Name => BindValue::Text(schema.name.clone()),
            PolicyField::Description => BindValue::Text(schema.description.clone()),
            PolicyField::ProjectId => BindValue::BigInt(schema.project_id),
            PolicyField::ProviderId => BindValue::BigInt(schema.provider_id),
            PolicyField::Filters => BindValue::Text(schema.filters_raw.clone()),
            PolicyField::Trigger => BindValue::Text(schema.trigger_raw.clone()),
            PolicyField::Enabled => BindValue::Bool(schema.enabled),
            PolicyField::Scope => BindValue::Text(schema.scope.clone()),
            PolicyField::ExtraAttrs => BindValue::Text(schema.extra_attrs_raw.clone()),
        };
        sets.push(format!("\"{}\" = ${bind_idx}", field.column()));
        bind_values.push(value);
        bind_idx += 1;
    }

    (sets, bind_values)
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_row_values<'q>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, PreheatPolicyRow, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, PreheatPolicyRow, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Bool(v) => q = q.bind(*v),
        }
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_scalar_values<'q>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Bool(v) => q = q.bind(*v),
        }
    }
    q
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
