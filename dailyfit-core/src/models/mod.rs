mod food_entry;
mod goals;
mod meal;
mod meal_type;
mod summary;

pub use food_entry::{FoodEntry, UNKNOWN_FOOD};
pub(crate) use food_entry::new_food_id;
pub use goals::{GoalKind, GoalRange, GoalRanges, Goals};
pub use meal::Meal;
pub use meal_type::MealType;
pub use summary::{DailySummary, NutritionTotals};
