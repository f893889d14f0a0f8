//! Document store abstraction.
//!
//! The taxonomy and nutrition records live in a key/range-queryable
//! document store. Everything above this module talks to it only through
//! [`DocumentStore`], so the backing implementation can be swapped without
//! touching the tools.
//!
//! ## Collections
//!
//! - `food_hierarchy` - `{category, subcategory, food_items[]}`
//! - `food_items` - `{name, nutrients{..}, servings[..]}`

mod error;
mod filter;
mod memory;

pub use error::{StoreError, StoreResult};
pub use filter::Filter;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// A single stored record.
pub type Document = Map<String, Value>;

/// Collection holding category → subcategory → items documents.
pub const HIERARCHY_COLLECTION: &str = "food_hierarchy";

/// Collection holding per-food nutrition documents.
pub const NUTRITION_COLLECTION: &str = "food_items";

/// Read-side contract of the document store.
///
/// Implementations must be safe to call concurrently from many in-flight
/// tool invocations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Return every document in `collection` matching `filter`, in stored order.
    async fn find_many(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>>;

    /// Health check; `Ok(())` means the store is reachable.
    async fn ping(&self) -> StoreResult<()>;
}
