use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Label used when the food catalog supplies no name.
pub const UNKNOWN_FOOD: &str = "Unknown Food";

/// One food attached to a meal.
///
/// Macro values are per unit; `quantity` multiplies them. Values come from the
/// food catalog and are not validated here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    pub id: String,
    pub name: String,
    pub calories_per_unit: f64,
    pub fat_per_unit: f64,
    pub carbs_per_unit: f64,
    pub protein_per_unit: f64,
    pub quantity: u32,
}

impl FoodEntry {
    /// Creates an entry with a fresh id and a quantity of one.
    pub fn new(name: impl Into<String>, calories_per_unit: f64) -> Self {
        let name = name.into();
        let name = match name.trim() {
            "" => UNKNOWN_FOOD.to_string(),
            trimmed => trimmed.to_string(),
        };
        Self {
            id: new_food_id(),
            name,
            calories_per_unit,
            fat_per_unit: 0.0,
            carbs_per_unit: 0.0,
            protein_per_unit: 0.0,
            quantity: 1,
        }
    }

    pub fn with_macros(mut self, fat: f64, carbs: f64, protein: f64) -> Self {
        self.fat_per_unit = fat;
        self.carbs_per_unit = carbs;
        self.protein_per_unit = protein;
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity.max(1);
        self
    }

    pub fn total_calories(&self) -> f64 {
        self.calories_per_unit * f64::from(self.quantity)
    }

    pub fn total_fat(&self) -> f64 {
        self.fat_per_unit * f64::from(self.quantity)
    }

    pub fn total_carbs(&self) -> f64 {
        self.carbs_per_unit * f64::from(self.quantity)
    }

    pub fn total_protein(&self) -> f64 {
        self.protein_per_unit * f64::from(self.quantity)
    }
}

impl fmt::Display for FoodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{} ({} kcal)", self.name, self.quantity, self.total_calories())
    }
}

pub(crate) fn new_food_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_assigns_unique_ids() {
        let a = FoodEntry::new("rice", 200.0);
        let b = FoodEntry::new("rice", 200.0);
        assert_ne!(a.id, b.id);
        assert_eq!(a.quantity, 1);
    }

    #[test]
    fn test_blank_name_gets_placeholder() {
        assert_eq!(FoodEntry::new("   ", 10.0).name, UNKNOWN_FOOD);
        assert_eq!(FoodEntry::new(" miso ", 10.0).name, "miso");
    }

    #[test]
    fn test_with_quantity_clamps_to_one() {
        let entry = FoodEntry::new("egg", 80.0).with_quantity(0);
        assert_eq!(entry.quantity, 1);
    }

    #[test]
    fn test_totals_scale_with_quantity() {
        let entry = FoodEntry::new("rice", 200.0)
            .with_macros(1.0, 44.0, 4.0)
            .with_quantity(3);
        assert_eq!(entry.total_calories(), 600.0);
        assert_eq!(entry.total_fat(), 3.0);
        assert_eq!(entry.total_carbs(), 132.0);
        assert_eq!(entry.total_protein(), 12.0);
    }

    #[test]
    fn test_json_uses_camel_case() {
        let entry = FoodEntry::new("rice", 200.0);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["caloriesPerUnit"], 200.0);
        assert_eq!(json["quantity"], 1);
    }
}
