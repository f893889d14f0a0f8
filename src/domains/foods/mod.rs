//! Food taxonomy and nutrition queries.
//!
//! Thin services over the [`DocumentStore`](crate::domains::store::DocumentStore)
//! used by the tool handlers. Store errors are returned unchanged; the tool
//! layer classifies them.

mod hierarchy;
pub mod model;
mod nutrition;

pub use hierarchy::HierarchyService;
pub use model::{CategoryRef, FoodMatch, FoodStats, Hierarchy, HierarchyEntry, NutritionRecord, Serving};
pub use nutrition::NutritionService;
