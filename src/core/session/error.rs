//! Session-specific error types.

use serde_json::json;
use thiserror::Error;

use crate::domains::tools::{FailureKind, ToolFailure};

/// Errors raised while negotiating or resolving a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The request carried no session id on a stateful transport.
    #[error("Missing session id")]
    MissingSessionId,

    /// The session id was never issued by this server.
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// The session existed but was closed or timed out.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// The client asked for a protocol version this server does not speak.
    #[error("Unsupported protocol version {requested:?}; supported: {}", .supported.join(", "))]
    NegotiationFailed {
        requested: Option<String>,
        supported: Vec<String>,
    },
}

impl SessionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingSessionId | Self::UnknownSession(_) => FailureKind::UnknownSession,
            Self::SessionExpired(_) => FailureKind::SessionExpired,
            Self::NegotiationFailed { .. } => FailureKind::NegotiationFailed,
        }
    }

    /// Structured `{kind, message, details?}` form delivered to clients.
    pub fn to_failure(&self) -> ToolFailure {
        let failure = ToolFailure::new(self.kind(), self.to_string());
        match self {
            Self::NegotiationFailed { supported, .. } => {
                failure.with_details(json!({ "supported": supported }))
            }
            _ => failure,
        }
    }
}
