//! Remote backend gateway.
//!
//! The backend exposes four endpoints:
//!
//! - `GET /food_data?name=` searches the food catalog
//! - `GET /goals/{userId}` returns the user's goals
//! - `POST /daily-data` records a closed day's totals
//! - `PATCH /goal_setting/{userId}` replaces the user's goals
//!
//! [`BackendGateway`] is the seam the goal store and the rollover manager
//! talk to; [`HttpBackend`] is the reqwest implementation.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{DailySummary, FoodEntry, Goals};

pub use http::HttpBackend;

/// Goals as the backend returns them. Fields may be numbers or numeric
/// strings and are validated by the goal store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GoalsPayload {
    #[serde(rename = "goalWeight", default)]
    pub goal_weight: Option<Value>,
    #[serde(default)]
    pub steps: Option<Value>,
    #[serde(rename = "goalCalories", default)]
    pub goal_calories: Option<Value>,
    #[serde(rename = "waterGoal", default)]
    pub water_goal: Option<Value>,
}

/// One row of the food catalog as the backend returns it.
///
/// Nutrient values are per unit and may be numbers or numeric strings; the
/// carbohydrate column is spelled `carbohidrates` on the wire.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogFood {
    pub food_id: Option<Value>,
    pub fname: Option<String>,
    pub calories: Option<Value>,
    pub fat: Option<Value>,
    #[serde(rename = "carbohidrates")]
    pub carbs: Option<Value>,
    pub protein: Option<Value>,
}

impl From<CatalogFood> for FoodEntry {
    fn from(row: CatalogFood) -> Self {
        let mut food = FoodEntry::new(row.fname.unwrap_or_default(), amount(&row.calories))
            .with_macros(amount(&row.fat), amount(&row.carbs), amount(&row.protein));

        match row.food_id {
            Some(Value::String(id)) if !id.trim().is_empty() => food.id = id.trim().to_string(),
            Some(Value::Number(id)) => food.id = id.to_string(),
            _ => {}
        }
        food
    }
}

/// Missing or unreadable nutrient values count as zero.
fn amount(value: &Option<Value>) -> f64 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n: &f64| n.is_finite() && *n >= 0.0).unwrap_or(0.0)
}

/// Body of a goal edit.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct GoalUpdate {
    #[serde(rename = "goalWeight")]
    pub goal_weight: u32,
    pub steps: u32,
    #[serde(rename = "goalCalories")]
    pub goal_calories: u32,
    #[serde(rename = "goalWater")]
    pub goal_water: u32,
}

impl From<&Goals> for GoalUpdate {
    fn from(goals: &Goals) -> Self {
        Self {
            goal_weight: goals.weight,
            steps: goals.steps,
            goal_calories: goals.calories,
            goal_water: goals.water,
        }
    }
}

/// A backend call failed: transport, status or body.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Server returned status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

#[async_trait]
pub trait BackendGateway: Send + Sync {
    async fn search_foods(&self, query: &str) -> Result<Vec<FoodEntry>, BackendError>;

    async fn fetch_goals(&self, user_id: &str) -> Result<GoalsPayload, BackendError>;

    async fn submit_daily_summary(&self, summary: &DailySummary) -> Result<(), BackendError>;

    async fn update_goals(&self, user_id: &str, goals: &GoalUpdate) -> Result<(), BackendError>;
}
