//! Tool-specific error types.

use thiserror::Error;

use super::envelope::{FailureKind, ToolFailure};
use super::schema::SchemaViolation;
use crate::domains::store::StoreError;

/// Errors raised while building or querying the tool tables.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A tool with this name is already registered.
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    /// The requested tool was not found.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A value does not match the tool's declared schema.
    #[error("Schema violation: {0}")]
    SchemaViolation(#[from] SchemaViolation),
}

/// Errors a tool handler can return.
///
/// The handler table converts these into [`ToolFailure`]s; none of them
/// escape past the dispatch boundary.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The underlying document store is unreachable or erroring.
    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),

    /// Arguments passed validation but could not be interpreted.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The call was cancelled before it reached the store.
    #[error("Tool execution cancelled")]
    Cancelled,

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::DataSourceUnavailable(_) => FailureKind::DataSourceUnavailable,
            Self::InvalidArguments(_) => FailureKind::InvalidArguments,
            Self::Cancelled => FailureKind::Cancelled,
            Self::Internal(_) => FailureKind::Internal,
        }
    }
}

impl From<StoreError> for ToolError {
    fn from(err: StoreError) -> Self {
        Self::DataSourceUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization failed: {err}"))
    }
}

impl From<ToolError> for ToolFailure {
    fn from(err: ToolError) -> Self {
        ToolFailure::new(err.kind(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_data_source_unavailable() {
        let err: ToolError = StoreError::unavailable("connection refused").into();
        let failure = ToolFailure::from(err);
        assert_eq!(failure.kind, FailureKind::DataSourceUnavailable);
        assert!(failure.message.contains("connection refused"));
    }

    #[test]
    fn test_cancelled_keeps_its_own_kind() {
        let failure = ToolFailure::from(ToolError::Cancelled);
        assert_eq!(failure.kind, FailureKind::Cancelled);
        assert_eq!(failure.message, "Tool execution cancelled");
        assert_eq!(ToolError::Internal("x".into()).kind(), FailureKind::Internal);
    }
}
