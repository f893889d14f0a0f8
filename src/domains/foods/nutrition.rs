//! Queries over per-food nutrition records.

use std::sync::Arc;
use tracing::info;

use super::model::{NutritionRecord, decode_all};
use crate::domains::store::{DocumentStore, Filter, NUTRITION_COLLECTION, StoreResult};

/// Read-only access to the `food_items` collection.
#[derive(Clone)]
pub struct NutritionService {
    store: Arc<dyn DocumentStore>,
}

impl NutritionService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn records(&self, filter: &Filter) -> StoreResult<Vec<NutritionRecord>> {
        let documents = self.store.find_many(NUTRITION_COLLECTION, filter).await?;
        decode_all(NUTRITION_COLLECTION, documents)
    }

    /// Names of every food with nutrition data, sorted.
    pub async fn names(&self) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = self
            .records(&Filter::All)
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect();
        names.sort();
        names.dedup();
        info!("Retrieved {} food names with nutrition data", names.len());
        Ok(names)
    }

    /// First record whose name equals `name`, ignoring case.
    pub async fn lookup(&self, name: &str) -> StoreResult<Option<NutritionRecord>> {
        let record = self
            .records(&Filter::equals_ignore_case("name", name))
            .await?
            .into_iter()
            .next();
        info!(found = record.is_some(), "Nutrition lookup for '{}'", name);
        Ok(record)
    }

    /// Records whose name contains `keyword`, ignoring case, sorted by name.
    pub async fn search(&self, keyword: &str) -> StoreResult<Vec<NutritionRecord>> {
        let mut records = self
            .records(&Filter::contains_ignore_case("name", keyword))
            .await?;
        records.sort_by(|a, b| a.name.cmp(&b.name));
        info!(
            "Found {} nutrition records for keyword '{}'",
            records.len(),
            keyword
        );
        Ok(records)
    }
}
