//! Queries over the category → subcategory → items taxonomy.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use super::model::{CategoryRef, FoodMatch, FoodStats, Hierarchy, HierarchyEntry, decode_all};
use crate::domains::store::{DocumentStore, Filter, HIERARCHY_COLLECTION, StoreResult};

/// Read-only access to the `food_hierarchy` collection.
///
/// Every method performs a single store round-trip.
#[derive(Clone)]
pub struct HierarchyService {
    store: Arc<dyn DocumentStore>,
}

impl HierarchyService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn entries(&self, filter: &Filter) -> StoreResult<Vec<HierarchyEntry>> {
        let documents = self.store.find_many(HIERARCHY_COLLECTION, filter).await?;
        decode_all(HIERARCHY_COLLECTION, documents)
    }

    /// Distinct category names, sorted.
    pub async fn categories(&self) -> StoreResult<Vec<String>> {
        let entries = self.entries(&Filter::All).await?;
        let categories: BTreeSet<_> = entries.into_iter().map(|e| e.category).collect();
        info!("Retrieved {} categories", categories.len());
        Ok(categories.into_iter().collect())
    }

    /// Distinct subcategories of `category`, sorted. Unknown categories yield nothing.
    pub async fn subcategories(&self, category: &str) -> StoreResult<Vec<String>> {
        let entries = self.entries(&Filter::eq("category", category)).await?;
        let subcategories: BTreeSet<_> = entries.into_iter().map(|e| e.subcategory).collect();
        info!(
            "Retrieved {} subcategories for '{}'",
            subcategories.len(),
            category
        );
        Ok(subcategories.into_iter().collect())
    }

    /// Items of a category, optionally narrowed to one subcategory.
    ///
    /// Items keep their stored order; repeats across subcategories are dropped.
    pub async fn food_items(&self, category: &str, subcategory: Option<&str>) -> StoreResult<Vec<String>> {
        let filter = match subcategory {
            Some(sub) => Filter::And(vec![
                Filter::eq("category", category),
                Filter::eq("subcategory", sub),
            ]),
            None => Filter::eq("category", category),
        };

        let mut seen = HashSet::new();
        let items: Vec<String> = self
            .entries(&filter)
            .await?
            .into_iter()
            .flat_map(|e| e.food_items)
            .filter(|item| seen.insert(item.clone()))
            .collect();

        debug!(category, ?subcategory, count = items.len(), "food_items");
        Ok(items)
    }

    /// Items whose name contains `keyword`, ignoring case.
    pub async fn search(&self, keyword: &str) -> StoreResult<Vec<FoodMatch>> {
        let needle = keyword.to_lowercase();
        let entries = self
            .entries(&Filter::contains_ignore_case("food_items", keyword))
            .await?;

        let matches: Vec<FoodMatch> = entries
            .into_iter()
            .flat_map(|entry| {
                let HierarchyEntry {
                    category,
                    subcategory,
                    food_items,
                } = entry;
                food_items
                    .into_iter()
                    .filter(|item| item.to_lowercase().contains(&needle))
                    .map(move |item| FoodMatch {
                        category: category.clone(),
                        subcategory: subcategory.clone(),
                        item,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        info!("Found {} results for keyword '{}'", matches.len(), keyword);
        Ok(matches)
    }

    /// Every category/subcategory listing `item` (exact name, ignoring case).
    pub async fn locate(&self, item: &str) -> StoreResult<Vec<CategoryRef>> {
        let entries = self
            .entries(&Filter::equals_ignore_case("food_items", item))
            .await?;
        Ok(entries
            .into_iter()
            .map(|e| CategoryRef {
                category: e.category,
                subcategory: e.subcategory,
            })
            .collect())
    }

    /// All distinct item names, sorted.
    pub async fn all_items(&self) -> StoreResult<Vec<String>> {
        let entries = self.entries(&Filter::All).await?;
        let items: BTreeSet<_> = entries.into_iter().flat_map(|e| e.food_items).collect();
        info!("Retrieved {} unique food items", items.len());
        Ok(items.into_iter().collect())
    }

    pub async fn stats(&self) -> StoreResult<FoodStats> {
        let entries = self.entries(&Filter::All).await?;

        let categories: HashSet<&str> = entries.iter().map(|e| e.category.as_str()).collect();
        let subcategories: HashSet<&str> = entries.iter().map(|e| e.subcategory.as_str()).collect();
        let items: HashSet<&str> = entries
            .iter()
            .flat_map(|e| e.food_items.iter().map(String::as_str))
            .collect();
        let sizes: Vec<usize> = entries.iter().map(|e| e.food_items.len()).collect();

        let average = if sizes.is_empty() {
            0.0
        } else {
            sizes.iter().sum::<usize>() as f64 / sizes.len() as f64
        };

        Ok(FoodStats {
            total_categories: categories.len(),
            total_subcategories: subcategories.len(),
            total_items: items.len(),
            average_items_per_subcategory: (average * 100.0).round() / 100.0,
            max_items_in_subcategory: sizes.iter().copied().max().unwrap_or(0),
            min_items_in_subcategory: sizes.iter().copied().min().unwrap_or(0),
        })
    }

    /// The whole taxonomy as nested maps.
    pub async fn hierarchy(&self) -> StoreResult<Hierarchy> {
        let entries = self.entries(&Filter::All).await?;
        let mut hierarchy: Hierarchy = BTreeMap::new();
        for entry in entries {
            hierarchy
                .entry(entry.category)
                .or_default()
                .entry(entry.subcategory)
                .or_default()
                .extend(entry.food_items);
        }
        Ok(hierarchy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::store::MemoryStore;

    fn service() -> HierarchyService {
        HierarchyService::new(Arc::new(MemoryStore::sample().unwrap()))
    }

    fn small() -> HierarchyService {
        let store = MemoryStore::from_json_str(
            r#"{"food_hierarchy": [
                {"category": "snacks", "subcategory": "fried", "food_items": ["Curly Fries", "Chips"]},
                {"category": "produce", "subcategory": "potatoes", "food_items": ["Baked Potato", "Curly Fries"]},
                {"category": "produce", "subcategory": "fruits", "food_items": ["Apple"]}
            ]}"#,
        )
        .unwrap();
        HierarchyService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_categories_sorted_and_distinct() {
        let categories = small().categories().await.unwrap();
        assert_eq!(categories, vec!["produce", "snacks"]);
    }

    #[tokio::test]
    async fn test_subcategories() {
        let service = small();
        assert_eq!(
            service.subcategories("produce").await.unwrap(),
            vec!["fruits", "potatoes"]
        );
        assert!(service.subcategories("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_food_items_with_and_without_subcategory() {
        let service = small();
        assert_eq!(
            service.food_items("produce", Some("potatoes")).await.unwrap(),
            vec!["Baked Potato", "Curly Fries"]
        );
        assert_eq!(
            service.food_items("produce", None).await.unwrap(),
            vec!["Baked Potato", "Curly Fries", "Apple"]
        );
        assert!(service.food_items("produce", Some("dairy")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let matches = small().search("FRIES").await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].category, "snacks");
        assert_eq!(matches[1].subcategory, "potatoes");
        assert!(matches.iter().all(|m| m.item == "Curly Fries"));
    }

    #[tokio::test]
    async fn test_locate_exact_match_only() {
        let service = small();
        let refs = service.locate("curly fries").await.unwrap();
        assert_eq!(refs.len(), 2);
        assert!(service.locate("curly").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_items_and_stats() {
        let service = small();
        assert_eq!(
            service.all_items().await.unwrap(),
            vec!["Apple", "Baked Potato", "Chips", "Curly Fries"]
        );

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_categories, 2);
        assert_eq!(stats.total_subcategories, 3);
        assert_eq!(stats.total_items, 4);
        assert_eq!(stats.max_items_in_subcategory, 2);
        assert_eq!(stats.min_items_in_subcategory, 1);
        assert!((stats.average_items_per_subcategory - 1.67).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_stats_on_empty_store() {
        let service = HierarchyService::new(Arc::new(MemoryStore::new()));
        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_items, 0);
        assert_eq!(stats.average_items_per_subcategory, 0.0);
    }

    #[tokio::test]
    async fn test_hierarchy_matches_sample() {
        let hierarchy = service().hierarchy().await.unwrap();
        assert!(hierarchy["dairy"]["cheese"].contains(&"Cheddar".to_string()));
        let categories: Vec<_> = hierarchy.keys().cloned().collect();
        assert_eq!(categories, service().categories().await.unwrap());
    }
}
