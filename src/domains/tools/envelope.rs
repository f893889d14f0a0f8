//! Invocation requests, results, and the response envelope.
//!
//! Every tool call produces exactly one [`ResponseEnvelope`] carrying the
//! caller's correlation id and either a validated payload or a structured
//! [`ToolFailure`].

use rmcp::model::{CallToolResult, Content};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;

/// Opaque client-supplied id used to match responses to calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub Value);

impl CorrelationId {
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Self(Value::String(id.to_string()))
    }
}

impl From<i64> for CorrelationId {
    fn from(id: i64) -> Self {
        Self(Value::from(id))
    }
}

impl From<Value> for CorrelationId {
    fn from(id: Value) -> Self {
        Self(id)
    }
}

/// Stable failure classification delivered to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    UnknownTool,
    InvalidArguments,
    Timeout,
    InternalSchemaViolation,
    DataSourceUnavailable,
    Internal,
    /// The call was cancelled before it produced a result.
    Cancelled,
    UnknownSession,
    SessionExpired,
    NegotiationFailed,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownTool => "UnknownTool",
            Self::InvalidArguments => "InvalidArguments",
            Self::Timeout => "Timeout",
            Self::InternalSchemaViolation => "InternalSchemaViolation",
            Self::DataSourceUnavailable => "DataSourceUnavailable",
            Self::Internal => "Internal",
            Self::Cancelled => "Cancelled",
            Self::UnknownSession => "UnknownSession",
            Self::SessionExpired => "SessionExpired",
            Self::NegotiationFailed => "NegotiationFailed",
        }
    }

    /// Whether a client may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::DataSourceUnavailable)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error object `{kind, message, details?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ToolFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("kind".to_string(), json!(self.kind.as_str()));
        object.insert("message".to_string(), json!(self.message));
        if let Some(details) = &self.details {
            object.insert("details".to_string(), details.clone());
        }
        Value::Object(object)
    }
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of one invocation: exactly one of payload or failure.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    Success(Value),
    Failure(ToolFailure),
}

impl InvocationResult {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure(ToolFailure::new(kind, message))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.kind),
        }
    }
}

/// A parsed tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub id: CorrelationId,
    /// Session the call arrived on, absent for one-shot transports.
    pub session_id: Option<String>,
    pub tool: String,
    pub arguments: Map<String, Value>,
}

impl InvocationRequest {
    pub fn new(id: impl Into<CorrelationId>, tool: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                // Reserved key so the strict validator reports it.
                let mut map = Map::new();
                map.insert("$arguments".to_string(), other);
                map
            }
        };

        Self {
            id: id.into(),
            session_id: None,
            tool: tool.into(),
            arguments,
        }
    }

    #[must_use]
    pub fn in_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }
}

/// The uniform wrapper around every tool response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub id: CorrelationId,
    #[serde(flatten)]
    pub outcome: Outcome,
    /// One-line text for human readers, alongside a successful payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Discriminated body of an envelope, serialized as
/// `{"status":"ok","result":...}` or `{"status":"error","error":{...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok { result: Value },
    Error { error: ToolFailure },
}

impl ResponseEnvelope {
    pub fn new(id: CorrelationId, result: InvocationResult) -> Self {
        let outcome = match result {
            InvocationResult::Success(result) => Outcome::Ok { result },
            InvocationResult::Failure(error) => Outcome::Error { error },
        };
        Self {
            id,
            outcome,
            summary: None,
        }
    }

    pub fn failed(id: CorrelationId, failure: ToolFailure) -> Self {
        Self::new(id, InvocationResult::Failure(failure))
    }

    #[must_use]
    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, Outcome::Ok { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Ok { result } => Some(result),
            Outcome::Error { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&ToolFailure> {
        match &self.outcome {
            Outcome::Ok { .. } => None,
            Outcome::Error { error } => Some(error),
        }
    }

    /// Convert to the MCP `tools/call` result shape.
    ///
    /// Successful payloads travel as `structuredContent`, led by the text
    /// summary when there is one. Failures are flagged with `isError` and
    /// carry the `{kind, message, details}` object.
    pub fn into_call_tool_result(self) -> CallToolResult {
        match self.outcome {
            Outcome::Ok { result } => {
                let mut call_result = CallToolResult::structured(result);
                if let Some(summary) = self.summary {
                    call_result.content.insert(0, Content::text(summary));
                }
                call_result
            }
            Outcome::Error { error } => CallToolResult::structured_error(error.to_value()),
        }
    }
}
