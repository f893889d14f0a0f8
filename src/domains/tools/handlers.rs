//! Handler Table - tool name to business-logic handler.
//!
//! Handlers receive arguments that already passed input validation and
//! return either a JSON payload or a [`ToolError`]. The table converts every
//! outcome into an [`InvocationResult`]; handler errors and panics never
//! escape [`HandlerTable::invoke`].

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use super::envelope::{CorrelationId, FailureKind, InvocationResult, ToolFailure};
use super::error::{RegistryError, ToolError};
use super::schema::ObjectSchema;

// ============================================================================
// Handler traits
// ============================================================================

/// Static metadata of a tool: its name, description and schemas.
pub trait ToolDefinition {
    /// Tool name as advertised to clients.
    const NAME: &'static str;

    /// Tool description shown to clients.
    const DESCRIPTION: &'static str;

    fn input_schema() -> ObjectSchema;

    fn output_schema() -> ObjectSchema;
}

/// Business logic behind one tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError>;

    /// One-line human-readable description of a validated payload.
    fn summarize(&self, _payload: &Value) -> Option<String> {
        None
    }
}

/// Deserialize validated arguments into a tool's parameter struct.
pub fn parse_args<P: DeserializeOwned>(args: Map<String, Value>) -> Result<P, ToolError> {
    serde_json::from_value(Value::Object(args)).map_err(|e| ToolError::invalid_arguments(e.to_string()))
}

/// Serialize a tool's output struct into its payload.
pub fn to_payload<T: Serialize>(output: &T) -> Result<Value, ToolError> {
    Ok(serde_json::to_value(output)?)
}

/// Read a payload back as a tool's output struct and describe it.
pub fn summarize_as<T, F>(payload: &Value, describe: F) -> Option<String>
where
    T: DeserializeOwned,
    F: FnOnce(T) -> String,
{
    serde_json::from_value(payload.clone()).ok().map(describe)
}

// ============================================================================
// Per-call context
// ============================================================================

/// What a handler knows about the call it is serving.
#[derive(Debug, Clone)]
pub struct ToolContext {
    correlation_id: CorrelationId,
    cancel: CancellationToken,
}

impl ToolContext {
    pub fn new(correlation_id: CorrelationId, cancel: CancellationToken) -> Self {
        Self {
            correlation_id,
            cancel,
        }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run a store round-trip unless the call has been cancelled.
    ///
    /// Cancellation is checked before the call starts and raced against it
    /// while it runs; either way the result is [`ToolError::Cancelled`].
    pub async fn guard<F, T, E>(&self, fut: F) -> Result<T, ToolError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<ToolError>,
    {
        if self.cancel.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ToolError::Cancelled),
            result = fut => result.map_err(Into::into),
        }
    }
}

// ============================================================================
// Handler Table
// ============================================================================

/// Immutable-after-startup map of tool handlers.
#[derive(Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, handler: Arc<dyn ToolHandler>) -> Result<(), RegistryError> {
        if self.handlers.contains_key(name) {
            return Err(RegistryError::DuplicateTool(name.to_string()));
        }
        self.handlers.insert(name.to_string(), handler);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Text summary for a payload produced by the handler under `name`.
    pub fn summarize(&self, name: &str, payload: &Value) -> Option<String> {
        self.handlers.get(name)?.summarize(payload)
    }

    /// Run the handler registered under `name`.
    pub async fn invoke(&self, name: &str, args: Map<String, Value>, ctx: &ToolContext) -> InvocationResult {
        let Some(handler) = self.handlers.get(name) else {
            return InvocationResult::failure(FailureKind::UnknownTool, format!("Unknown tool: {name}"));
        };

        match AssertUnwindSafe(handler.call(args, ctx)).catch_unwind().await {
            Ok(Ok(data)) => InvocationResult::Success(data),
            Ok(Err(err)) => InvocationResult::Failure(ToolFailure::from(err)),
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(tool = name, id = %ctx.correlation_id(), "Tool handler panicked: {}", reason);
                InvocationResult::failure(
                    FailureKind::Internal,
                    format!("Tool '{name}' failed unexpectedly: {reason}"),
                )
            }
        }
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerTable").field("handlers", &names).finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
