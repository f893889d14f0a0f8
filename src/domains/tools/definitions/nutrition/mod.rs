//! Tools over per-food nutrition records (`food_items` collection).

pub mod get;
pub mod names;
pub mod search;

pub use get::GetFoodNutritionTool;
pub use names::ListFoodNamesTool;
pub use search::SearchFoodNutritionTool;

use crate::domains::tools::{ObjectSchema, Schema};

/// Shape of a serialized [`NutritionRecord`](crate::domains::foods::NutritionRecord).
pub(crate) fn nutrition_record_schema() -> Schema {
    let serving = ObjectSchema::strict()
        .required("label", Schema::String, "Serving description, e.g. 'medium'")
        .required("amount", Schema::Number, "Weight or volume of the serving")
        .required("unit", Schema::String, "'g' or 'ml'");

    Schema::Object(
        ObjectSchema::strict()
            .required("name", Schema::String, "Food name as stored")
            .required("nutrients", Schema::map(Schema::Number), "Nutrient amounts keyed by nutrient name")
            .required("servings", Schema::array(Schema::Object(serving)), "Available serving sizes"),
    )
}
