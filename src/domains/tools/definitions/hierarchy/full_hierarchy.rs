//! Get all food hierarchy tool definition.
//!
//! Dumps the whole taxonomy as nested maps.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::domains::foods::{Hierarchy, HierarchyService};
use crate::domains::tools::{
    ObjectSchema, Schema, ToolContext, ToolDefinition, ToolError, ToolHandler, summarize_as,
    to_payload,
};

/// The whole taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullHierarchyOutput {
    /// Category to subcategory to item names.
    pub hierarchy: Hierarchy,
    /// Number of top-level categories.
    pub total_categories: usize,
}

impl FullHierarchyOutput {
    pub fn summary(&self) -> String {
        let pairs: usize = self.hierarchy.values().map(|subcategories| subcategories.len()).sum();
        format!("Retrieved complete food hierarchy with {pairs} category-subcategory combinations")
    }
}

/// Get all food hierarchy tool - the taxonomy as nested maps.
pub struct GetAllFoodHierarchyTool {
    service: HierarchyService,
}

impl GetAllFoodHierarchyTool {
    pub fn new(service: HierarchyService) -> Self {
        Self { service }
    }
}

impl ToolDefinition for GetAllFoodHierarchyTool {
    const NAME: &'static str = "get_all_food_hierarchy";
    const DESCRIPTION: &'static str = "Return the full food hierarchy as a mapping of category to subcategory to food items.";

    fn input_schema() -> ObjectSchema {
        ObjectSchema::strict()
    }

    fn output_schema() -> ObjectSchema {
        ObjectSchema::strict()
            .required(
                "hierarchy",
                Schema::map(Schema::map(Schema::array(Schema::String))),
                "Category to subcategory to food items",
            )
            .required("total_categories", Schema::Integer, "Number of categories")
    }
}

#[async_trait]
impl ToolHandler for GetAllFoodHierarchyTool {
    #[instrument(skip_all, name = "get_all_food_hierarchy")]
    async fn call(&self, _args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        let hierarchy = ctx.guard(self.service.hierarchy()).await?;
        to_payload(&FullHierarchyOutput {
            total_categories: hierarchy.len(),
            hierarchy,
        })
    }

    fn summarize(&self, payload: &Value) -> Option<String> {
        summarize_as(payload, |output: FullHierarchyOutput| output.summary())
    }
}
