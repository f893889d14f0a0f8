//! Food stats tool definition.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::domains::foods::{FoodStats, HierarchyService};
use crate::domains::tools::{
    ObjectSchema, Schema, ToolContext, ToolDefinition, ToolError, ToolHandler, summarize_as,
    to_payload,
};

/// Food stats tool - size figures for the whole taxonomy.
pub struct FoodStatsTool {
    service: HierarchyService,
}

impl FoodStatsTool {
    pub fn new(service: HierarchyService) -> Self {
        Self { service }
    }
}

impl ToolDefinition for FoodStatsTool {
    const NAME: &'static str = "food_stats";
    const DESCRIPTION: &'static str = "Return high-level statistics about the food hierarchy: category, subcategory and item counts plus items per subcategory.";

    fn input_schema() -> ObjectSchema {
        ObjectSchema::strict()
    }

    fn output_schema() -> ObjectSchema {
        ObjectSchema::strict()
            .required("total_categories", Schema::Integer, "Distinct categories")
            .required("total_subcategories", Schema::Integer, "Distinct subcategories")
            .required("total_items", Schema::Integer, "Distinct food items")
            .required("average_items_per_subcategory", Schema::Number, "Average number of food items per subcategory")
            .required("max_items_in_subcategory", Schema::Integer, "Maximum number of items in any subcategory")
            .required("min_items_in_subcategory", Schema::Integer, "Minimum number of items in any subcategory")
    }
}

#[async_trait]
impl ToolHandler for FoodStatsTool {
    #[instrument(skip_all, name = "food_stats")]
    async fn call(&self, _args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        let stats = ctx.guard(self.service.stats()).await?;
        to_payload(&stats)
    }

    fn summarize(&self, payload: &Value) -> Option<String> {
        summarize_as(payload, |stats: FoodStats| {
            format!(
                "Food hierarchy contains {} categories, {} subcategories and {} items",
                stats.total_categories, stats.total_subcategories, stats.total_items
            )
        })
    }
}
