use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Nutrition summed over every meal of the day.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NutritionTotals {
    pub fat: f64,
    pub carbs: f64,
    pub protein: f64,
    pub total_calories: f64,
    pub percentage: i64,
}

/// Totals of a closed logical day, as submitted to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailySummary {
    pub user_id: String,
    pub log_date: NaiveDate,
    pub calories: i64,
    #[serde(rename = "waterIntake")]
    pub water_intake: u32,
    pub steps: u32,
}
