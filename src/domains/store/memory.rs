//! In-memory document store.
//!
//! Collections are loaded once from a JSON dataset of the form
//! `{ "<collection>": [ {..}, {..} ], .. }` and served read-only.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use super::{Document, DocumentStore, Filter, StoreError, StoreResult};

/// Dataset bundled with the binary, used when no data path is configured.
const SAMPLE_DATASET: &str = include_str!("../../../data/foods.json");

/// Read-only store backed by in-memory collections.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<Document>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store loaded with the bundled sample dataset.
    pub fn sample() -> StoreResult<Self> {
        Self::from_json_str(SAMPLE_DATASET)
    }

    /// Parse a dataset from a JSON string.
    pub fn from_json_str(json: &str) -> StoreResult<Self> {
        let root: Value = serde_json::from_str(json)?;
        let Value::Object(root) = root else {
            return Err(StoreError::malformed("<root>", "dataset must be a JSON object"));
        };

        let mut store = Self::new();
        for (collection, documents) in root {
            let Value::Array(documents) = documents else {
                return Err(StoreError::malformed(&collection, "collection must be an array"));
            };

            let documents = documents
                .into_iter()
                .enumerate()
                .map(|(i, doc)| match doc {
                    Value::Object(map) => Ok(map),
                    _ => Err(StoreError::malformed(
                        &collection,
                        format!("document {i} is not an object"),
                    )),
                })
                .collect::<StoreResult<Vec<_>>>()?;

            store.insert_many(&collection, documents);
        }

        Ok(store)
    }

    /// Load a dataset file.
    pub async fn from_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let store = Self::from_json_str(&json)?;
        info!(
            "Loaded dataset from {} ({} collections)",
            path.display(),
            store.collections.len()
        );
        Ok(store)
    }

    /// Append documents to a collection (startup only).
    pub fn insert_many(&mut self, collection: &str, documents: Vec<Document>) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_many(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let documents: Vec<Document> = self
            .collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();

        debug!(collection, matched = documents.len(), "find_many");
        Ok(documents)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::store::{HIERARCHY_COLLECTION, NUTRITION_COLLECTION};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sample_dataset_loads() {
        let store = MemoryStore::sample().unwrap();
        assert!(store.count(HIERARCHY_COLLECTION) > 0);
        assert!(store.count(NUTRITION_COLLECTION) > 0);
    }

    #[test]
    fn test_rejects_malformed_dataset() {
        assert!(matches!(
            MemoryStore::from_json_str("[]"),
            Err(StoreError::Malformed { .. })
        ));
        assert!(matches!(
            MemoryStore::from_json_str(r#"{"food_items": [1]}"#),
            Err(StoreError::Malformed { .. })
        ));
        assert!(matches!(
            MemoryStore::from_json_str("{not json"),
            Err(StoreError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_find_many_filters_in_stored_order() {
        let store = MemoryStore::from_json_str(
            r#"{"food_items": [{"name": "Kiwi"}, {"name": "Apple"}, {"name": "Pineapple"}]}"#,
        )
        .unwrap();

        let found = store
            .find_many(NUTRITION_COLLECTION, &Filter::contains_ignore_case("name", "apple"))
            .await
            .unwrap();
        let names: Vec<_> = found.iter().map(|d| d["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Apple", "Pineapple"]);

        let none = store.find_many("missing", &Filter::All).await.unwrap();
        assert!(none.is_empty());
        tokio_test::assert_ok!(store.ping().await);
    }

    #[tokio::test]
    async fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"food_hierarchy": [{{"category": "dairy", "subcategory": "cheese", "food_items": []}}]}}"#).unwrap();

        let store = MemoryStore::from_path(file.path()).await.unwrap();
        assert_eq!(store.count(HIERARCHY_COLLECTION), 1);

        let missing = MemoryStore::from_path("/nonexistent/foods.json").await;
        assert!(matches!(missing, Err(StoreError::Io(_))));
    }
}
