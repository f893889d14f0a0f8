//! Search food tool definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::domains::foods::{FoodMatch, HierarchyService};
use crate::domains::tools::{
    ObjectSchema, Schema, ToolContext, ToolDefinition, ToolError, ToolHandler, parse_args,
    summarize_as, to_payload,
};

/// Parameters for the search food tool.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchFoodParams {
    /// Text to search for inside food item names.
    pub keyword: String,
}

/// Items whose name contains the keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFoodOutput {
    /// The keyword as sent by the client.
    pub keyword: String,
    /// Each match with the category and subcategory it sits in.
    pub results: Vec<FoodMatch>,
    pub total_matches: usize,
}

impl SearchFoodOutput {
    pub fn summary(&self) -> String {
        format!("Found {} food items matching '{}'", self.total_matches, self.keyword)
    }
}

/// Search food tool - case-insensitive substring search over item names.
pub struct SearchFoodTool {
    service: HierarchyService,
}

impl SearchFoodTool {
    pub fn new(service: HierarchyService) -> Self {
        Self { service }
    }
}

impl ToolDefinition for SearchFoodTool {
    const NAME: &'static str = "search_food";
    const DESCRIPTION: &'static str = "Search food items by keyword (case-insensitive) and return each match with its category and subcategory.";

    fn input_schema() -> ObjectSchema {
        ObjectSchema::strict().required("keyword", Schema::String, "Text to search inside food item names")
    }

    fn output_schema() -> ObjectSchema {
        let food_match = ObjectSchema::strict()
            .required("category", Schema::String, "")
            .required("subcategory", Schema::String, "")
            .required("item", Schema::String, "");

        ObjectSchema::strict()
            .required("keyword", Schema::String, "The keyword searched for")
            .required("results", Schema::array(Schema::Object(food_match)), "Matching items")
            .required("total_matches", Schema::Integer, "Number of matches")
    }
}

#[async_trait]
impl ToolHandler for SearchFoodTool {
    #[instrument(skip_all, name = "search_food")]
    async fn call(&self, args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        let params: SearchFoodParams = parse_args(args)?;
        let results = ctx.guard(self.service.search(&params.keyword)).await?;
        to_payload(&SearchFoodOutput {
            keyword: params.keyword,
            total_matches: results.len(),
            results,
        })
    }

    fn summarize(&self, payload: &Value) -> Option<String> {
        summarize_as(payload, |output: SearchFoodOutput| output.summary())
    }
}
