//! Pure meal computations.
//!
//! Every function takes the current meal by reference and returns a new
//! [`Meal`]; nothing here touches storage or the network.

use std::collections::HashSet;

use crate::models::{new_food_id, FoodEntry, Meal, NutritionTotals};

/// Whole-percent share of `calorie_goal`, or 0 when there is no goal.
pub fn calorie_percentage(total_calories: f64, calorie_goal: u32) -> i64 {
    if calorie_goal == 0 {
        return 0;
    }
    (total_calories / f64::from(calorie_goal) * 100.0).round() as i64
}

/// Builds a meal and its totals from `foods`.
pub fn compute_meal(foods: &[FoodEntry], calorie_goal: u32) -> Meal {
    let fat = foods.iter().map(FoodEntry::total_fat).sum();
    let carbs = foods.iter().map(FoodEntry::total_carbs).sum();
    let protein = foods.iter().map(FoodEntry::total_protein).sum();
    let total_calories: f64 = foods.iter().map(FoodEntry::total_calories).sum();
    let percentage = if foods.is_empty() {
        0
    } else {
        calorie_percentage(total_calories, calorie_goal)
    };

    Meal::from_parts(
        foods.to_vec(),
        fat,
        carbs,
        protein,
        total_calories,
        percentage,
    )
}

/// Appends `new_foods` after the meal's existing entries.
///
/// Existing entries keep their ids and quantities. An incoming entry whose id
/// is empty or already present in the meal gets a fresh one.
pub fn add_foods_to_meal(meal: &Meal, new_foods: Vec<FoodEntry>, calorie_goal: u32) -> Meal {
    let mut foods = meal.foods().to_vec();
    let mut seen: HashSet<String> = foods.iter().map(|f| f.id.clone()).collect();

    for mut food in new_foods {
        if food.id.is_empty() || seen.contains(&food.id) {
            food.id = new_food_id();
        }
        food.quantity = food.quantity.max(1);
        seen.insert(food.id.clone());
        foods.push(food);
    }

    compute_meal(&foods, calorie_goal)
}

/// Changes the quantity of one entry by `delta`, never going below one.
///
/// An unknown `food_id` leaves the meal as it was.
pub fn adjust_quantity(meal: &Meal, food_id: &str, delta: i64, calorie_goal: u32) -> Meal {
    let foods: Vec<FoodEntry> = meal
        .foods()
        .iter()
        .map(|food| {
            if food.id != food_id {
                return food.clone();
            }
            let quantity = i64::from(food.quantity)
                .saturating_add(delta)
                .clamp(1, i64::from(u32::MAX));
            FoodEntry {
                quantity: quantity as u32,
                ..food.clone()
            }
        })
        .collect();

    compute_meal(&foods, calorie_goal)
}

/// Drops one entry. An unknown `food_id` leaves the meal as it was.
pub fn remove_food(meal: &Meal, food_id: &str, calorie_goal: u32) -> Meal {
    let foods: Vec<FoodEntry> = meal
        .foods()
        .iter()
        .filter(|food| food.id != food_id)
        .cloned()
        .collect();

    compute_meal(&foods, calorie_goal)
}

/// Sums several meals into day totals.
pub fn sum_meals<'a>(
    meals: impl IntoIterator<Item = &'a Meal>,
    calorie_goal: u32,
) -> NutritionTotals {
    let mut totals = meals.into_iter().fold(NutritionTotals::default(), |mut acc, meal| {
        acc.fat += meal.fat();
        acc.carbs += meal.carbs();
        acc.protein += meal.protein();
        acc.total_calories += meal.total_calories();
        acc
    });
    totals.percentage = calorie_percentage(totals.total_calories, calorie_goal);
    totals
}
