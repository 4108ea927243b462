//! Dailyfit Core Library
//!
//! Meal aggregation, the daily ledger, user goals and the 03:00 day rollover
//! shared by dailyfit front ends.

pub mod aggregator;
pub mod backend;
pub mod error;
pub mod goal_store;
pub mod ledger;
pub mod logical_day;
pub mod models;
pub mod rollover;
pub mod session;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{
    BackendError, BackendGateway, CatalogFood, GoalUpdate, GoalsPayload, HttpBackend,
};
pub use error::{RangeViolation, ValidationError};
pub use goal_store::{GoalError, GoalStore};
pub use ledger::{DailyLedger, LedgerSnapshot, MealSlots};
pub use logical_day::{logical_day, DAY_START_HOUR};
pub use models::{
    DailySummary, FoodEntry, GoalKind, GoalRange, GoalRanges, Goals, Meal, MealType,
    NutritionTotals,
};
pub use rollover::{
    DayRolloverManager, RolloverError, RolloverOutcome, RolloverReport, RolloverState, Submission,
};
pub use session::Session;
pub use storage::{Batch, Change, FileStore, KeyValueStore, MemoryStore, StorageError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
