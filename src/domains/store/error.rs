//! Store-specific error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored document does not have the expected shape.
    #[error("Malformed document in '{collection}': {reason}")]
    Malformed { collection: String, reason: String },

    /// The dataset could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The dataset is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Create an "unavailable" error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a "malformed document" error.
    pub fn malformed(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            collection: collection.into(),
            reason: reason.into(),
        }
    }
}
