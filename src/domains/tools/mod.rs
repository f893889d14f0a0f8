//! Tools domain module.
//!
//! This module handles everything between a decoded tool call and its
//! response envelope.
//!
//! ## Architecture
//!
//! - `schema.rs` - Structural schemas, validation and JSON-Schema rendering
//! - `registry.rs` - Schema Registry: tool descriptors by name
//! - `handlers.rs` - Handler Table: tool name to business logic
//! - `dispatcher.rs` - Validate, invoke (time-bounded), check output, wrap
//! - `envelope.rs` - Invocation requests, results and the response envelope
//! - `catalog.rs` - Startup registration of every tool
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` (e.g., `my_tool.rs`)
//! 2. Implement `ToolDefinition` (name, description, schemas) and `ToolHandler`
//! 3. Export it in `definitions/mod.rs`
//! 4. Register it in `catalog.rs`
//!
//! Discovery and dispatch pick it up from the tables; no transport changes.

mod catalog;
pub mod definitions;
mod dispatcher;
mod envelope;
mod error;
mod handlers;
mod registry;
mod schema;

pub use catalog::{ToolCatalog, build_tool_catalog};
pub use dispatcher::Dispatcher;
pub use envelope::{
    CorrelationId, FailureKind, InvocationRequest, InvocationResult, Outcome, ResponseEnvelope,
    ToolFailure,
};
pub use error::{RegistryError, ToolError};
pub use handlers::{
    HandlerTable, ToolContext, ToolDefinition, ToolHandler, parse_args, summarize_as, to_payload,
};
pub use registry::{SchemaRegistry, ToolDescriptor};
pub use schema::{ObjectSchema, Schema, SchemaViolation, ViolationReason};
