//! Error types for the data layer.
//!
//! Repositories, the filter engine and the analytics engine all return
//! [`StoreError`]. The CLI wraps it with `anyhow` context.

/// Result type for data-layer operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised while reading or writing records.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A required field is missing or a value is out of range.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An argument could not be coerced (e.g. an id that is not a positive integer).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No record with this id exists in the collection.
    #[error("{table} record {id} not found")]
    NotFound { table: &'static str, id: u64 },

    /// The store answered but reported a failure.
    #[error("store error: {0}")]
    Upstream(String),

    /// The request failed before the store produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// A payload did not match the expected record shape.
    #[error("malformed record: {0}")]
    Decode(#[from] serde_json::Error),

    /// A fixture file could not be read.
    #[error("fixture error: {0}")]
    Fixture(String),
}

impl StoreError {
    /// Whether this error means the record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Whether this error was caused by the caller's input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StoreError::Validation(_) | StoreError::InvalidArgument(_)
        )
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StoreError::Network("request timed out".to_string())
        } else if e.is_connect() {
            StoreError::Network(format!("cannot connect to record store: {}", e))
        } else if e.is_decode() {
            StoreError::Upstream(format!("unreadable store response: {}", e))
        } else {
            StoreError::Network(e.to_string())
        }
    }
}
