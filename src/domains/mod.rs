//! Domains module containing business logic organized by bounded contexts.
//!
//! - `store` - the document store holding the taxonomy and nutrition records
//! - `foods` - taxonomy and nutrition queries over the store
//! - `tools` - schemas, handlers and dispatch of the advertised tools

pub mod foods;
pub mod store;
pub mod tools;
