//! Find food category tool definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::domains::foods::{CategoryRef, HierarchyService};
use crate::domains::tools::{
    ObjectSchema, Schema, ToolContext, ToolDefinition, ToolError, ToolHandler, parse_args,
    summarize_as, to_payload,
};

/// Parameters for the find food category tool.
#[derive(Debug, Clone, Deserialize)]
pub struct FindCategoryParams {
    /// A food name to look up.
    pub item: String,
}

/// Where an item is listed in the taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindCategoryOutput {
    /// The item that was looked up.
    pub item: String,
    /// Whether at least one location was found.
    pub found: bool,
    /// Every category/subcategory pair listing the item.
    pub matches: Vec<CategoryRef>,
}

impl FindCategoryOutput {
    pub fn summary(&self) -> String {
        format!("Found {} category matches for '{}'", self.matches.len(), self.item)
    }
}

/// Find food category tool - where an item sits in the taxonomy.
///
/// A miss is a normal result with `found: false`.
pub struct FindFoodCategoryTool {
    service: HierarchyService,
}

impl FindFoodCategoryTool {
    pub fn new(service: HierarchyService) -> Self {
        Self { service }
    }
}

impl ToolDefinition for FindFoodCategoryTool {
    const NAME: &'static str = "find_food_category";
    const DESCRIPTION: &'static str = "Find the category and subcategory of a food item (case-insensitive exact match).";

    fn input_schema() -> ObjectSchema {
        ObjectSchema::strict().required("item", Schema::String, "A food name to look up")
    }

    fn output_schema() -> ObjectSchema {
        let location = ObjectSchema::strict()
            .required("category", Schema::String, "")
            .required("subcategory", Schema::String, "");

        ObjectSchema::strict()
            .required("item", Schema::String, "The requested item")
            .required("found", Schema::Boolean, "Whether the item exists in the taxonomy")
            .required("matches", Schema::array(Schema::Object(location)), "Every place the item is listed")
    }
}

#[async_trait]
impl ToolHandler for FindFoodCategoryTool {
    #[instrument(skip_all, name = "find_food_category")]
    async fn call(&self, args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        let params: FindCategoryParams = parse_args(args)?;
        let matches = ctx.guard(self.service.locate(&params.item)).await?;
        to_payload(&FindCategoryOutput {
            item: params.item,
            found: !matches.is_empty(),
            matches,
        })
    }

    fn summarize(&self, payload: &Value) -> Option<String> {
        summarize_as(payload, |output: FindCategoryOutput| output.summary())
    }
}
