//! Dispatcher - validate, invoke, check, wrap.
//!
//! One call runs strictly in order: descriptor lookup, input validation,
//! bounded handler invocation, output validation, envelope. The dispatcher
//! only reads the registry and the handler table, so any number of calls
//! from any number of sessions may run through it at once.

use rmcp::model::Tool;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

use super::envelope::{
    CorrelationId, FailureKind, InvocationRequest, InvocationResult, ResponseEnvelope, ToolFailure,
};
use super::error::RegistryError;
use super::handlers::{HandlerTable, ToolContext};
use super::registry::{SchemaRegistry, ToolDescriptor};

/// Routes invocation requests to handlers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<SchemaRegistry>,
    handlers: Arc<HandlerTable>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<SchemaRegistry>, handlers: Arc<HandlerTable>, timeout: Duration) -> Self {
        Self {
            registry,
            handlers,
            timeout,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Discovery: every registered tool, in registration order.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.registry.descriptors().map(ToolDescriptor::to_tool).collect()
    }

    /// Dispatch one request.
    ///
    /// Returns `None` when `cancel` fires before the call completes; the
    /// call is abandoned and nothing must be sent back for it.
    #[instrument(skip_all, fields(tool = %request.tool, id = %request.id))]
    pub async fn dispatch(
        &self,
        request: InvocationRequest,
        cancel: &CancellationToken,
    ) -> Option<ResponseEnvelope> {
        debug!(session = ?request.session_id, "Dispatching tool call");

        let InvocationRequest {
            id, tool, arguments, ..
        } = request;

        let result = self.run(&tool, arguments, &id, cancel).await?;
        log_outcome(&tool, &result);

        let summary = match &result {
            InvocationResult::Success(data) => self.handlers.summarize(&tool, data),
            InvocationResult::Failure(_) => None,
        };
        Some(ResponseEnvelope::new(id, result).with_summary(summary))
    }

    async fn run(
        &self,
        tool: &str,
        arguments: Map<String, Value>,
        id: &CorrelationId,
        cancel: &CancellationToken,
    ) -> Option<InvocationResult> {
        if let Err(err) = self.registry.lookup(tool) {
            return Some(InvocationResult::failure(FailureKind::UnknownTool, err.to_string()));
        }

        match self.registry.validate_input(tool, &arguments) {
            Ok(()) => {}
            Err(RegistryError::SchemaViolation(violation)) => {
                let failure = ToolFailure::new(
                    FailureKind::InvalidArguments,
                    format!("Invalid arguments for '{tool}': {violation}"),
                )
                .with_details(&violation);
                return Some(InvocationResult::Failure(failure));
            }
            Err(err) => {
                return Some(InvocationResult::failure(FailureKind::UnknownTool, err.to_string()));
            }
        }

        let call_token = cancel.child_token();
        let ctx = ToolContext::new(id.clone(), call_token.clone());

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Call abandoned by cancellation");
                return None;
            }
            outcome = tokio::time::timeout(self.timeout, self.handlers.invoke(tool, arguments, &ctx)) => outcome,
        };

        let result = match outcome {
            Ok(result) => result,
            Err(_) => {
                call_token.cancel();
                let timeout_ms = self.timeout.as_millis() as u64;
                let failure = ToolFailure::new(
                    FailureKind::Timeout,
                    format!("Tool '{tool}' did not complete within {timeout_ms} ms"),
                )
                .with_details(json!({ "timeout_ms": timeout_ms }));
                return Some(InvocationResult::Failure(failure));
            }
        };

        if cancel.is_cancelled() {
            debug!("Call finished after cancellation, discarding result");
            return None;
        }

        match result {
            InvocationResult::Success(data) => match self.registry.validate_output(tool, &data) {
                Ok(()) => Some(InvocationResult::Success(data)),
                Err(err) => {
                    let mut failure = ToolFailure::new(
                        FailureKind::InternalSchemaViolation,
                        format!("Tool '{tool}' produced output that violates its schema"),
                    );
                    if let RegistryError::SchemaViolation(violation) = &err {
                        failure = failure.with_details(violation);
                    }
                    Some(InvocationResult::Failure(failure))
                }
            },
            failure => Some(failure),
        }
    }
}

fn log_outcome(tool: &str, result: &InvocationResult) {
    let InvocationResult::Failure(failure) = result else {
        debug!("Tool call succeeded");
        return;
    };

    match failure.kind {
        FailureKind::UnknownTool | FailureKind::InvalidArguments => {
            warn!(tool, kind = %failure.kind, "Rejected tool call: {}", failure.message);
        }
        _ => {
            error!(tool, kind = %failure.kind, details = ?failure.details, "Tool call failed: {}", failure.message);
        }
    }
}
