//! Tools over the food taxonomy (`food_hierarchy` collection).

pub mod categories;
pub mod find_category;
pub mod food_items;
pub mod full_hierarchy;
pub mod list_all;
pub mod search;
pub mod stats;
pub mod subcategories;

pub use categories::GetCategoriesTool;
pub use find_category::FindFoodCategoryTool;
pub use food_items::GetFoodItemsTool;
pub use full_hierarchy::GetAllFoodHierarchyTool;
pub use list_all::ListAllFoodsTool;
pub use search::SearchFoodTool;
pub use stats::FoodStatsTool;
pub use subcategories::GetSubcategoriesTool;
