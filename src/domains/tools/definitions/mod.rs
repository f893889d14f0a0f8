//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file, grouped by the collection it reads.

pub mod hierarchy;
pub mod nutrition;

pub use hierarchy::{
    FindFoodCategoryTool, FoodStatsTool, GetAllFoodHierarchyTool, GetCategoriesTool,
    GetFoodItemsTool, GetSubcategoriesTool, ListAllFoodsTool, SearchFoodTool,
};
pub use nutrition::{GetFoodNutritionTool, ListFoodNamesTool, SearchFoodNutritionTool};
