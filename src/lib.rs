//! Food MCP Server Library
//!
//! A Model Context Protocol (MCP) server exposing a food taxonomy
//! (category → subcategory → items) and per-food nutrition records as tools.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Configuration, error handling, the server handler, sessions and transports
//! - **domains**: Business logic organized by bounded contexts
//!   - **store**: The document store holding both collections
//!   - **foods**: Taxonomy and nutrition queries
//!   - **tools**: Schemas, handlers and the dispatcher behind the advertised tools
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use food_mcp_server::{core::Config, core::McpServer, domains::store::MemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let store = Arc::new(MemoryStore::sample()?);
//!     let server = McpServer::new(config, store)?;
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
