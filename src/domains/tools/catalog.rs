//! Startup wiring for the tool tables.
//!
//! Every tool is registered here exactly once, into both the
//! [`SchemaRegistry`] and the [`HandlerTable`]. The two tables are frozen
//! behind `Arc`s by the caller and never change afterwards.

use std::sync::Arc;
use tracing::info;

use super::definitions::{
    FindFoodCategoryTool, FoodStatsTool, GetAllFoodHierarchyTool, GetCategoriesTool,
    GetFoodItemsTool, GetFoodNutritionTool, GetSubcategoriesTool, ListAllFoodsTool,
    ListFoodNamesTool, SearchFoodNutritionTool, SearchFoodTool,
};
use super::error::RegistryError;
use super::handlers::{HandlerTable, ToolDefinition, ToolHandler};
use super::registry::SchemaRegistry;
use crate::domains::foods::{HierarchyService, NutritionService};
use crate::domains::store::DocumentStore;

/// The two startup-built tables.
#[derive(Debug, Default)]
pub struct ToolCatalog {
    pub registry: SchemaRegistry,
    pub handlers: HandlerTable,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one tool's schemas and handler under its name.
    pub fn register<T>(&mut self, tool: T) -> Result<(), RegistryError>
    where
        T: ToolDefinition + ToolHandler + 'static,
    {
        self.registry
            .register(T::NAME, T::input_schema(), T::output_schema(), T::DESCRIPTION)?;
        self.handlers.register(T::NAME, Arc::new(tool))
    }

    /// Freeze into shared, read-only tables.
    pub fn into_shared(self) -> (Arc<SchemaRegistry>, Arc<HandlerTable>) {
        (Arc::new(self.registry), Arc::new(self.handlers))
    }
}

/// Build the catalog of all food tools over `store`.
pub fn build_tool_catalog(store: Arc<dyn DocumentStore>) -> Result<ToolCatalog, RegistryError> {
    let hierarchy = HierarchyService::new(store.clone());
    let nutrition = NutritionService::new(store);

    let mut catalog = ToolCatalog::new();
    catalog.register(GetAllFoodHierarchyTool::new(hierarchy.clone()))?;
    catalog.register(GetCategoriesTool::new(hierarchy.clone()))?;
    catalog.register(GetSubcategoriesTool::new(hierarchy.clone()))?;
    catalog.register(GetFoodItemsTool::new(hierarchy.clone()))?;
    catalog.register(SearchFoodTool::new(hierarchy.clone()))?;
    catalog.register(FindFoodCategoryTool::new(hierarchy.clone()))?;
    catalog.register(ListAllFoodsTool::new(hierarchy.clone()))?;
    catalog.register(FoodStatsTool::new(hierarchy))?;
    catalog.register(ListFoodNamesTool::new(nutrition.clone()))?;
    catalog.register(GetFoodNutritionTool::new(nutrition.clone()))?;
    catalog.register(SearchFoodNutritionTool::new(nutrition))?;

    info!("Registered {} tools", catalog.registry.len());
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::store::MemoryStore;
    use crate::domains::tools::{Dispatcher, FailureKind, InvocationRequest};
    use serde_json::{Value, json};
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    const ALL_TOOLS: [&str; 11] = [
        "get_all_food_hierarchy",
        "get_categories",
        "get_subcategories",
        "get_food_items",
        "search_food",
        "find_food_category",
        "list_all_foods",
        "food_stats",
        "list_food_names",
        "get_food_nutrition",
        "search_food_nutrition",
    ];

    fn dispatcher() -> Dispatcher {
        let catalog = build_tool_catalog(Arc::new(MemoryStore::sample().unwrap())).unwrap();
        let (registry, handlers) = catalog.into_shared();
        Dispatcher::new(registry, handlers, Duration::from_secs(5))
    }

    #[test]
    fn test_catalog_registers_every_tool_once() {
        let catalog = build_tool_catalog(Arc::new(MemoryStore::new())).unwrap();
        assert_eq!(catalog.registry.tool_names(), ALL_TOOLS.to_vec());
        assert_eq!(catalog.handlers.len(), ALL_TOOLS.len());
        for name in ALL_TOOLS {
            assert!(catalog.handlers.contains(name));
        }
    }

    #[test]
    fn test_registering_twice_fails() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let mut catalog = ToolCatalog::new();
        catalog
            .register(GetCategoriesTool::new(HierarchyService::new(store.clone())))
            .unwrap();
        let err = catalog
            .register(GetCategoriesTool::new(HierarchyService::new(store)))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTool(_)));
    }

    #[test]
    fn test_discovery_lists_each_tool_once_with_schemas() {
        let tools = dispatcher().list_tools();
        let names: HashSet<_> = tools.iter().map(|t| t.name.to_string()).collect();
        assert_eq!(names.len(), ALL_TOOLS.len());
        assert!(tools.iter().all(|t| t.output_schema.is_some()));
    }

    #[test]
    fn test_declared_schemas_accept_their_own_examples() {
        let dispatcher = dispatcher();
        let registry = dispatcher.registry();
        for descriptor in registry.descriptors() {
            let input = descriptor.input_schema.example();
            assert!(registry.validate_input(&descriptor.name, &input).is_ok());
            let output = Value::Object(descriptor.output_schema.example());
            assert!(
                registry.validate_output(&descriptor.name, &output).is_ok(),
                "{} output example",
                descriptor.name
            );
        }
    }

    #[tokio::test]
    async fn test_get_food_nutrition_scenarios() {
        let dispatcher = dispatcher();
        let cancel = CancellationToken::new();

        let apple = dispatcher
            .dispatch(
                InvocationRequest::new(1_i64, "get_food_nutrition", json!({ "name": "Apple" })),
                &cancel,
            )
            .await
            .unwrap();
        let payload = apple.payload().unwrap();
        assert_eq!(payload["requested_name"], "Apple");
        assert_eq!(payload["found"], true);
        assert_eq!(payload["nutrition"]["nutrients"]["calories"], 95);

        let missing = dispatcher
            .dispatch(
                InvocationRequest::new(2_i64, "get_food_nutrition", json!({ "name": "Unobtainium" })),
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(
            missing.payload().unwrap(),
            &json!({ "requested_name": "Unobtainium", "found": false, "nutrition": null })
        );
    }

    #[tokio::test]
    async fn test_extraneous_argument_is_rejected() {
        let envelope = dispatcher()
            .dispatch(
                InvocationRequest::new("x", "get_categories", json!({ "unexpected": true })),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(envelope.failure().unwrap().kind, FailureKind::InvalidArguments);
    }

    #[tokio::test]
    async fn test_unregistered_tool_is_unknown() {
        let envelope = dispatcher()
            .dispatch(
                InvocationRequest::new("y", "delete_everything", json!({})),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(envelope.failure().unwrap().kind, FailureKind::UnknownTool);
    }
}
