//! Get food nutrition tool definition.
//!
//! Looks up one nutrition record by name. A miss is a normal result with
//! `found: false` and `nutrition: null`, not an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::nutrition_record_schema;
use crate::domains::foods::{NutritionRecord, NutritionService};
use crate::domains::tools::{
    ObjectSchema, Schema, ToolContext, ToolDefinition, ToolError, ToolHandler, parse_args,
    summarize_as, to_payload,
};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the get food nutrition tool.
#[derive(Debug, Clone, Deserialize)]
pub struct FoodNutritionParams {
    /// Food name (case-insensitive exact match).
    pub name: String,
}

// ============================================================================
// Output Structure
// ============================================================================

/// Result of a nutrition lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodNutritionOutput {
    /// The name exactly as the client sent it.
    pub requested_name: String,
    /// Whether a record matched
    pub found: bool,
    /// The matching record, `null` on a miss.
    pub nutrition: Option<NutritionRecord>,
}

impl FoodNutritionOutput {
    pub fn summary(&self) -> String {
        let Some(record) = &self.nutrition else {
            return format!("No nutrition data found for '{}'", self.requested_name);
        };
        match record.nutrients.get("calories") {
            Some(calories) => format!(
                "Found nutrition data for '{}': {} calories per serving",
                record.name, calories
            ),
            None => format!("Found nutrition data for '{}'", record.name),
        }
    }
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Get food nutrition tool - one nutrition record by name.
pub struct GetFoodNutritionTool {
    service: NutritionService,
}

impl GetFoodNutritionTool {
    pub fn new(service: NutritionService) -> Self {
        Self { service }
    }
}

impl ToolDefinition for GetFoodNutritionTool {
    const NAME: &'static str = "get_food_nutrition";
    const DESCRIPTION: &'static str = "Get nutrition information for a food by name (case-insensitive exact match).";

    fn input_schema() -> ObjectSchema {
        ObjectSchema::strict().required("name", Schema::String, "The food name to look up")
    }

    fn output_schema() -> ObjectSchema {
        ObjectSchema::strict()
            .required("requested_name", Schema::String, "The food name that was requested")
            .required("found", Schema::Boolean, "Whether the food was found")
            .required(
                "nutrition",
                Schema::nullable(nutrition_record_schema()),
                "Nutrition record if the food was found",
            )
    }
}

#[async_trait]
impl ToolHandler for GetFoodNutritionTool {
    #[instrument(skip_all, name = "get_food_nutrition")]
    async fn call(&self, args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        let params: FoodNutritionParams = parse_args(args)?;
        let nutrition = ctx.guard(self.service.lookup(&params.name)).await?;

        if nutrition.is_none() {
            info!("No nutrition record for '{}'", params.name);
        }

        to_payload(&FoodNutritionOutput {
            requested_name: params.name,
            found: nutrition.is_some(),
            nutrition,
        })
    }

    fn summarize(&self, payload: &Value) -> Option<String> {
        summarize_as(payload, |output: FoodNutritionOutput| output.summary())
    }
}
