//! Get subcategories tool definition.

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

/// Parameters for the get subcategories tool.
#[derive(Debug, Clone, Deserialize)]
pub struct SubcategoriesParams {
    /// The parent food category name.
    pub category: String,
}

// ============================================================================
// Output Structure
// ============================================================================

/// Subcategories of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcategoriesOutput {
    /// The category that was asked for.
    pub category: String,
    /// Subcategory names, sorted. Empty for an unknown category.
    pub subcategories: Vec<String>,
    pub total_count: usize,
}

impl SubcategoriesOutput {
    pub fn summary(&self) -> String {
        format!(
            "Found {} subcategories in '{}': {}",
            self.total_count,
            self.category,
            self.subcategories.join(", ")
        )
    }
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Get subcategories tool - subcategories of one category, sorted.
pub struct GetSubcategoriesTool {
    service: HierarchyService,
}

impl GetSubcategoriesTool {
    pub fn new(service: HierarchyService) -> Self {
        Self { service }
    }
}

impl ToolDefinition for GetSubcategoriesTool {
    const NAME: &'static str = "get_subcategories";
    const DESCRIPTION: &'static str = "Return all subcategories for a given food category.";

    fn input_schema() -> ObjectSchema {
        ObjectSchema::strict().required("category", Schema::String, "The parent food category name")
    }

    fn output_schema() -> ObjectSchema {
        ObjectSchema::strict()
            .required("category", Schema::String, "The requested category")
            .required("subcategories", Schema::array(Schema::String), "Subcategory names, sorted")
            .required("total_count", Schema::Integer, "Number of subcategories")
    }
}

#[async_trait]
impl ToolHandler for GetSubcategoriesTool {
    #[instrument(skip_all, name = "get_subcategories")]
    async fn call(&self, args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        let params: SubcategoriesParams = parse_args(args)?;
        let subcategories = ctx.guard(self.service.subcategories(&params.category)).await?;
        to_payload(&SubcategoriesOutput {
            category: params.category,
            total_count: subcategories.len(),
            subcategories,
        })
    }

    fn summarize(&self, payload: &Value) -> Option<String> {
        summarize_as(payload, |output: SubcategoriesOutput| output.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::test_support::{call, sample_store};
    use serde_json::json;

    fn tool() -> GetSubcategoriesTool {
        GetSubcategoriesTool::new(HierarchyService::new(sample_store()))
    }

    #[tokio::test]
    async fn test_get_subcategories() {
        let payload = call(&tool(), json!({ "category": "dairy" })).await.unwrap();
        assert_eq!(
            payload,
            json!({
                "category": "dairy",
                "subcategories": ["cheese", "milk & yogurt"],
                "total_count": 2
            })
        );
    }

    #[tokio::test]
    async fn test_unknown_category_is_empty() {
        let payload = call(&tool(), json!({ "category": "desserts" })).await.unwrap();
        assert_eq!(payload["total_count"], 0);
    }
}
