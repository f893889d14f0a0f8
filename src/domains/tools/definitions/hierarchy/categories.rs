//! Get categories tool definition.
//!
//! Lists every top-level food category.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::domains::foods::HierarchyService;
use crate::domains::tools::{
    ObjectSchema, Schema, ToolContext, ToolDefinition, ToolError, ToolHandler, summarize_as,
    to_payload,
};

// ============================================================================
// Output Structure
// ============================================================================

/// Every category in the taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoriesOutput {
    /// Distinct category names, sorted.
    pub categories: Vec<String>,
    /// Number of categories.
    pub total_count: usize,
}

impl CategoriesOutput {
    pub fn summary(&self) -> String {
        format!(
            "Found {} food categories: {}",
            self.total_count,
            self.categories.join(", ")
        )
    }
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Get categories tool - distinct category names, sorted.
pub struct GetCategoriesTool {
    service: HierarchyService,
}

impl GetCategoriesTool {
    pub fn new(service: HierarchyService) -> Self {
        Self { service }
    }
}

impl ToolDefinition for GetCategoriesTool {
    const NAME: &'static str = "get_categories";
    const DESCRIPTION: &'static str = "Return a list of all food categories.";

    fn input_schema() -> ObjectSchema {
        ObjectSchema::strict()
    }

    fn output_schema() -> ObjectSchema {
        ObjectSchema::strict()
            .required("categories", Schema::array(Schema::String), "Category names, sorted")
            .required("total_count", Schema::Integer, "Number of categories")
    }
}

#[async_trait]
impl ToolHandler for GetCategoriesTool {
    #[instrument(skip_all, name = "get_categories")]
    async fn call(&self, _args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        let categories = ctx.guard(self.service.categories()).await?;
        to_payload(&CategoriesOutput {
            total_count: categories.len(),
            categories,
        })
    }

    fn summarize(&self, payload: &Value) -> Option<String> {
        summarize_as(payload, |output: CategoriesOutput| output.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::test_support::{call, sample_store};
    use serde_json::json;

    #[tokio::test]
    async fn test_get_categories() {
        let tool = GetCategoriesTool::new(HierarchyService::new(sample_store()));
        let payload = call(&tool, json!({})).await.unwrap();
        let output: CategoriesOutput = serde_json::from_value(payload).unwrap();

        assert_eq!(
            output.categories,
            vec!["dairy", "fruits & vegetables", "grains", "snacks"]
        );
        assert_eq!(output.total_count, 4);
        assert_eq!(
            output.summary(),
            "Found 4 food categories: dairy, fruits & vegetables, grains, snacks"
        );
    }
}
