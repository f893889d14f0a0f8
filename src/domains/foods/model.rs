//! Typed views over stored documents and the payloads built from them.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

use crate::domains::store::{Document, StoreError, StoreResult};

/// One `food_hierarchy` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    pub category: String,
    pub subcategory: String,
    #[serde(default)]
    pub food_items: Vec<String>,
}

/// One `food_items` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRecord {
    pub name: String,
    /// Nutrient name to amount, e.g. `calories -> 95`.
    #[serde(default)]
    pub nutrients: BTreeMap<String, Number>,
    #[serde(default)]
    pub servings: Vec<Serving>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Serving {
    pub label: String,
    pub amount: Number,
    pub unit: String,
}

/// An item located in the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodMatch {
    pub category: String,
    pub subcategory: String,
    pub item: String,
}

/// The category/subcategory pair an item belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub category: String,
    pub subcategory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodStats {
    pub total_categories: usize,
    pub total_subcategories: usize,
    pub total_items: usize,
    pub average_items_per_subcategory: f64,
    pub max_items_in_subcategory: usize,
    pub min_items_in_subcategory: usize,
}

/// Category → subcategory → items, key-sorted at both levels.
pub type Hierarchy = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Decode stored documents into a typed record.
pub(crate) fn decode_all<T: DeserializeOwned>(
    collection: &str,
    documents: Vec<Document>,
) -> StoreResult<Vec<T>> {
    documents
        .into_iter()
        .map(|doc| {
            serde_json::from_value(Value::Object(doc))
                .map_err(|e| StoreError::malformed(collection, e.to_string()))
        })
        .collect()
}
