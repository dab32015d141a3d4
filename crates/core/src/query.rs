//! Generic filter/pagination descriptor shared by list and count operations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Keyword under which list operations scope results to one project.
pub const KEYWORD_PROJECT_ID: &str = "project_id";

/// A single sort key. Ascending unless `desc` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub key: String,
    #[serde(default)]
    pub desc: bool,
}

/// Filter and pagination parameters passed through to the store.
///
/// `keywords` maps column names to equality constraints. A `page_size` of
/// `0` means the result is not paginated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub keywords: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub sorts: Vec<Sort>,
    #[serde(default)]
    pub page_number: i64,
    #[serde(default)]
    pub page_size: i64,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an equality constraint.
    pub fn with_keyword(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.keywords.insert(key.into(), value.into());
        self
    }

    pub fn with_sort(mut self, key: impl Into<String>, desc: bool) -> Self {
        self.sorts.push(Sort {
            key: key.into(),
            desc,
        });
        self
    }

    /// Request page `page_number` (1-based) of `page_size` rows.
    pub fn with_page(mut self, page_number: i64, page_size: i64) -> Self {
        self.page_number = page_number;
        self.page_size = page_size;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builder_accumulates_constraints() {
        let query = Query::new()
            .with_keyword("name", "nightly")
            .with_keyword("enabled", true)
            .with_sort("creation_time", true)
            .with_page(2, 15);

        assert_eq!(query.keywords.get("name"), Some(&json!("nightly")));
        assert_eq!(query.keywords.get("enabled"), Some(&json!(true)));
        assert_eq!(query.sorts.len(), 1);
        assert!(query.sorts[0].desc);
        assert_eq!((query.page_number, query.page_size), (2, 15));
    }

    #[test]
    fn with_keyword_replaces_existing_value() {
        let query = Query::new()
            .with_keyword(KEYWORD_PROJECT_ID, 1)
            .with_keyword(KEYWORD_PROJECT_ID, 2);
        assert_eq!(query.keywords.len(), 1);
        assert_eq!(query.keywords[KEYWORD_PROJECT_ID], json!(2));
    }
}
