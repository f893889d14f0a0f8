//! Get food items tool definition.
//!
//! Items of a category, optionally narrowed to one subcategory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::domains::foods::HierarchyService;
use crate::domains::tools::{
    ObjectSchema, Schema, ToolContext, ToolDefinition, ToolError, ToolHandler, parse_args,
    summarize_as, to_payload,
};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the get food items tool.
#[derive(Debug, Clone, Deserialize)]
pub struct FoodItemsParams {
    /// The top-level food category.
    pub category: String,

    /// The sub-group inside the category; all subcategories when absent.
    #[serde(default)]
    pub subcategory: Option<String>,
}

// ============================================================================
// Output Structure
// ============================================================================

/// Items found under a category or one of its subcategories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItemsOutput {
    /// The category that was asked for.
    pub category: String,
    /// The subcategory that was asked for, `null` for the whole category.
    pub subcategory: Option<String>,
    /// Item names in stored order.
    pub food_items: Vec<String>,
    /// Number of items.
    pub total_count: usize,
}

impl FoodItemsOutput {
    pub fn summary(&self) -> String {
        match &self.subcategory {
            Some(subcategory) => format!(
                "Found {} food items in '{}' → '{}'",
                self.total_count, self.category, subcategory
            ),
            None => format!("Found {} food items in '{}'", self.total_count, self.category),
        }
    }
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Get food items tool - item names under a category.
pub struct GetFoodItemsTool {
    service: HierarchyService,
}

impl GetFoodItemsTool {
    pub fn new(service: HierarchyService) -> Self {
        Self { service }
    }
}

impl ToolDefinition for GetFoodItemsTool {
    const NAME: &'static str = "get_food_items";
    const DESCRIPTION: &'static str = "Return all food items for a given category, optionally limited to one subcategory.";

    fn input_schema() -> ObjectSchema {
        ObjectSchema::strict()
            .required("category", Schema::String, "The top-level food category")
            .optional(
                "subcategory",
                Schema::nullable(Schema::String),
                "The sub-group inside the category",
            )
    }

    fn output_schema() -> ObjectSchema {
        ObjectSchema::strict()
            .required("category", Schema::String, "The requested category")
            .required("subcategory", Schema::nullable(Schema::String), "The requested subcategory, if any")
            .required("food_items", Schema::array(Schema::String), "Food item names")
            .required("total_count", Schema::Integer, "Number of food items")
    }
}

#[async_trait]
impl ToolHandler for GetFoodItemsTool {
    #[instrument(skip_all, name = "get_food_items")]
    async fn call(&self, args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        let params: FoodItemsParams = parse_args(args)?;
        let food_items = ctx
            .guard(
                self.service
                    .food_items(&params.category, params.subcategory.as_deref()),
            )
            .await?;

        to_payload(&FoodItemsOutput {
            category: params.category,
            subcategory: params.subcategory,
            total_count: food_items.len(),
            food_items,
        })
    }

    fn summarize(&self, payload: &Value) -> Option<String> {
        summarize_as(payload, |output: FoodItemsOutput| output.summary())
    }
}
