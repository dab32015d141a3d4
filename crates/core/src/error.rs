use std::num::ParseIntError;

/// Domain-level error returned by the policy manager and helpers.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed policy data ({context}): {source}")]
    Malformed {
        context: &'static str,
        #[source]
        source: MalformedError,
    },

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store error during {operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Underlying cause of a [`CoreError::Malformed`].
#[derive(Debug, thiserror::Error)]
pub enum MalformedError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Int(#[from] ParseIntError),
}

impl CoreError {
    pub(crate) fn malformed(context: &'static str, source: impl Into<MalformedError>) -> Self {
        Self::Malformed {
            context,
            source: source.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
