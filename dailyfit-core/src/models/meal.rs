use serde::{Deserialize, Serialize};
use std::fmt;

use super::food_entry::FoodEntry;

/// The foods of one meal slot together with their derived totals.
///
/// A `Meal` is only built by the aggregator, so its totals always match its
/// foods and the calorie goal it was computed against.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    foods: Vec<FoodEntry>,
    fat: f64,
    carbs: f64,
    protein: f64,
    total_calories: f64,
    percentage: i64,
}

impl Meal {
    pub(crate) fn from_parts(
        foods: Vec<FoodEntry>,
        fat: f64,
        carbs: f64,
        protein: f64,
        total_calories: f64,
        percentage: i64,
    ) -> Self {
        Self {
            foods,
            fat,
            carbs,
            protein,
            total_calories,
            percentage,
        }
    }

    pub fn foods(&self) -> &[FoodEntry] {
        &self.foods
    }

    pub fn food(&self, food_id: &str) -> Option<&FoodEntry> {
        self.foods.iter().find(|f| f.id == food_id)
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    pub fn fat(&self) -> f64 {
        self.fat
    }

    pub fn carbs(&self) -> f64 {
        self.carbs
    }

    pub fn protein(&self) -> f64 {
        self.protein
    }

    pub fn total_calories(&self) -> f64 {
        self.total_calories
    }

    /// Share of the calorie goal, in whole percent.
    pub fn percentage(&self) -> i64 {
        self.percentage
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "fat {:.1}g  carbs {:.1}g  protein {:.1}g  {:.0} kcal ({}%)",
            self.fat, self.carbs, self.protein, self.total_calories, self.percentage
        )?;
        for food in &self.foods {
            writeln!(f, "  - {} [{}]", food, food.id)?;
        }
        Ok(())
    }
}
