//! Fixtures shared by the session tests.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;

use crate::domains::tools::{
    Dispatcher, HandlerTable, ObjectSchema, Schema, SchemaRegistry, ToolContext, ToolError,
    ToolHandler,
};

/// Sleeps for `ms` milliseconds, honouring cancellation.
struct Sleepy;

#[async_trait]
impl ToolHandler for Sleepy {
    async fn call(&self, args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        let ms = args.get("ms").and_then(Value::as_u64).unwrap_or(0);
        ctx.guard(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok::<_, ToolError>(json!({ "slept_ms": ms }))
        })
        .await
    }
}

/// A dispatcher exposing a single `sleep` tool.
pub(crate) fn sleepy_dispatcher() -> Dispatcher {
    let mut registry = SchemaRegistry::new();
    registry
        .register(
            "sleep",
            ObjectSchema::strict().required("ms", Schema::Integer, "Milliseconds to sleep"),
            ObjectSchema::strict().required("slept_ms", Schema::Integer, "Milliseconds slept"),
            "Sleep for a while",
        )
        .unwrap();
    let mut handlers = HandlerTable::new();
    handlers.register("sleep", Arc::new(Sleepy)).unwrap();
    Dispatcher::new(Arc::new(registry), Arc::new(handlers), Duration::from_secs(10))
}
