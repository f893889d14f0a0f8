//! List food names tool definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::domains::foods::NutritionService;
use crate::domains::tools::{
    ObjectSchema, Schema, ToolContext, ToolDefinition, ToolError, ToolHandler, summarize_as,
    to_payload,
};

/// Names of every food with a nutrition record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodNamesOutput {
    /// Food names, sorted.
    pub food_names: Vec<String>,
    pub total_count: usize,
}

impl FoodNamesOutput {
    pub fn summary(&self) -> String {
        format!("Found {} foods with nutrition data available", self.total_count)
    }
}

/// List food names tool - every food that has nutrition data.
pub struct ListFoodNamesTool {
    service: NutritionService,
}

impl ListFoodNamesTool {
    pub fn new(service: NutritionService) -> Self {
        Self { service }
    }
}

impl ToolDefinition for ListFoodNamesTool {
    const NAME: &'static str = "list_food_names";
    const DESCRIPTION: &'static str = "Return the names of all foods that have nutrition data available.";

    fn input_schema() -> ObjectSchema {
        ObjectSchema::strict()
    }

    fn output_schema() -> ObjectSchema {
        ObjectSchema::strict()
            .required("food_names", Schema::array(Schema::String), "Food names, sorted")
            .required("total_count", Schema::Integer, "Number of foods with nutrition data")
    }
}

#[async_trait]
impl ToolHandler for ListFoodNamesTool {
    #[instrument(skip_all, name = "list_food_names")]
    async fn call(&self, _args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        let food_names = ctx.guard(self.service.names()).await?;
        to_payload(&FoodNamesOutput {
            total_count: food_names.len(),
            food_names,
        })
    }

    fn summarize(&self, payload: &Value) -> Option<String> {
        summarize_as(payload, |output: FoodNamesOutput| output.summary())
    }
}
