//! Search food nutrition tool definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use super::nutrition_record_schema;
use crate::domains::foods::{NutritionRecord, NutritionService};
use crate::domains::tools::{
    ObjectSchema, Schema, ToolContext, ToolDefinition, ToolError, ToolHandler, parse_args,
    summarize_as, to_payload,
};

/// Parameters for the search food nutrition tool.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchNutritionParams {
    /// Text to search for inside food names.
    pub keyword: String,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionMatch {
    /// Name of the matching food.
    pub name: String,
    pub nutrition: NutritionRecord,
}

/// Nutrition records whose name contains the keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchNutritionOutput {
    /// The keyword as sent by the client.
    pub search_keyword: String,
    /// Hits in stored order.
    pub results: Vec<NutritionMatch>,
    pub total_matches: usize,
}

impl SearchNutritionOutput {
    pub fn summary(&self) -> String {
        format!(
            "Found {} nutrition entries matching '{}'",
            self.total_matches, self.search_keyword
        )
    }
}

/// Search food nutrition tool - nutrition records whose name contains a keyword.
pub struct SearchFoodNutritionTool {
    service: NutritionService,
}

impl SearchFoodNutritionTool {
    pub fn new(service: NutritionService) -> Self {
        Self { service }
    }
}

impl ToolDefinition for SearchFoodNutritionTool {
    const NAME: &'static str = "search_food_nutrition";
    const DESCRIPTION: &'static str = "Search nutrition records by keyword (case-insensitive substring of the food name).";

    fn input_schema() -> ObjectSchema {
        ObjectSchema::strict().required("keyword", Schema::String, "Text to search inside food names")
    }

    fn output_schema() -> ObjectSchema {
        let result = ObjectSchema::strict()
            .required("name", Schema::String, "")
            .required("nutrition", nutrition_record_schema(), "");

        ObjectSchema::strict()
            .required("search_keyword", Schema::String, "The keyword used for searching")
            .required("results", Schema::array(Schema::Object(result)), "Matching nutrition records")
            .required("total_matches", Schema::Integer, "Number of matches")
    }
}

#[async_trait]
impl ToolHandler for SearchFoodNutritionTool {
    #[instrument(skip_all, name = "search_food_nutrition")]
    async fn call(&self, args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        let params: SearchNutritionParams = parse_args(args)?;
        let records = ctx.guard(self.service.search(&params.keyword)).await?;

        let results: Vec<NutritionMatch> = records
            .into_iter()
            .map(|record| NutritionMatch {
                name: record.name.clone(),
                nutrition: record,
            })
            .collect();

        to_payload(&SearchNutritionOutput {
            search_keyword: params.keyword,
            total_matches: results.len(),
            results,
        })
    }

    fn summarize(&self, payload: &Value) -> Option<String> {
        summarize_as(payload, |output: SearchNutritionOutput| output.summary())
    }
}
