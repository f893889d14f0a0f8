//! List all foods tool definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::domains::foods::HierarchyService;
use crate::domains::tools::{
    ObjectSchema, Schema, ToolContext, ToolDefinition, ToolError, ToolHandler, summarize_as,
    to_payload,
};

/// Every item name in the taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListAllFoodsOutput {
    /// Distinct item names, sorted.
    pub foods: Vec<String>,
    pub total_count: usize,
}

impl ListAllFoodsOutput {
    pub fn summary(&self) -> String {
        format!("Retrieved {} unique food names from the hierarchy", self.total_count)
    }
}

/// List all foods tool - every item name in the taxonomy, deduplicated.
pub struct ListAllFoodsTool {
    service: HierarchyService,
}

impl ListAllFoodsTool {
    pub fn new(service: HierarchyService) -> Self {
        Self { service }
    }
}

impl ToolDefinition for ListAllFoodsTool {
    const NAME: &'static str = "list_all_foods";
    const DESCRIPTION: &'static str = "Return a deduplicated, sorted list of every food item name.";

    fn input_schema() -> ObjectSchema {
        ObjectSchema::strict()
    }

    fn output_schema() -> ObjectSchema {
        ObjectSchema::strict()
            .required("foods", Schema::array(Schema::String), "All food item names")
            .required("total_count", Schema::Integer, "Number of distinct items")
    }
}

#[async_trait]
impl ToolHandler for ListAllFoodsTool {
    #[instrument(skip_all, name = "list_all_foods")]
    async fn call(&self, _args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        let foods = ctx.guard(self.service.all_items()).await?;
        to_payload(&ListAllFoodsOutput {
            total_count: foods.len(),
            foods,
        })
    }

    fn summarize(&self, payload: &Value) -> Option<String> {
        summarize_as(payload, |output: ListAllFoodsOutput| output.summary())
    }
}
