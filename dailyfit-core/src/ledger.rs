//! The ledger of one logical day: four meal slots plus water and steps.
//!
//! Every mutation is mirrored to the key-value store in one batch. Meals,
//! water and steps always go to keys partitioned by the ledger's day. The
//! day-global counters read at rollover are only written once the ledger's
//! day has been rolled over to. Persistence is best effort; a failed write
//! is logged and the in-memory ledger stays authoritative for the session.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::aggregator::{self, compute_meal};
use crate::error::{parse_amount, ValidationError};
use crate::goal_store::GoalStore;
use crate::logical_day::parse_day_key;
use crate::models::{FoodEntry, Meal, MealType, NutritionTotals};
use crate::storage::{keys, read_json, Batch, KeyValueStore, StorageError};

/// The four meal slots, serialized as `{breakfast, lunch, dinner, snack}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MealSlots {
    pub breakfast: Meal,
    pub lunch: Meal,
    pub dinner: Meal,
    pub snack: Meal,
}

impl MealSlots {
    pub fn get(&self, meal_type: MealType) -> &Meal {
        match meal_type {
            MealType::Breakfast => &self.breakfast,
            MealType::Lunch => &self.lunch,
            MealType::Dinner => &self.dinner,
            MealType::Snack => &self.snack,
        }
    }

    fn get_mut(&mut self, meal_type: MealType) -> &mut Meal {
        match meal_type {
            MealType::Breakfast => &mut self.breakfast,
            MealType::Lunch => &mut self.lunch,
            MealType::Dinner => &mut self.dinner,
            MealType::Snack => &mut self.snack,
        }
    }

    /// Recomputes every slot against `calorie_goal`.
    fn recomputed(&self, calorie_goal: u32) -> MealSlots {
        MealSlots {
            breakfast: compute_meal(self.breakfast.foods(), calorie_goal),
            lunch: compute_meal(self.lunch.foods(), calorie_goal),
            dinner: compute_meal(self.dinner.foods(), calorie_goal),
            snack: compute_meal(self.snack.foods(), calorie_goal),
        }
    }
}

/// Read-only view of a ledger, used for display and JSON output.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub day: NaiveDate,
    pub meals: MealSlots,
    pub totals: NutritionTotals,
    pub water_intake: u32,
    pub remaining_water: i64,
    pub steps_intake: u32,
    pub remaining_steps: i64,
}

pub struct DailyLedger {
    day: NaiveDate,
    meals: MealSlots,
    water_intake: u32,
    steps_intake: u32,
    goals: Arc<GoalStore>,
    store: Arc<dyn KeyValueStore>,
}

impl DailyLedger {
    /// Creates an empty ledger for `day` without touching the store.
    pub fn empty(day: NaiveDate, goals: Arc<GoalStore>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            day,
            meals: MealSlots::default(),
            water_intake: 0,
            steps_intake: 0,
            goals,
            store,
        }
    }

    /// Rehydrates the ledger of `day` from the store.
    ///
    /// Everything is read from the day's own keys. The day-global water and
    /// steps counters are only a fallback, and only when the last completed
    /// rollover was for `day`; otherwise they belong to an earlier day.
    pub fn load(day: NaiveDate, goals: Arc<GoalStore>, store: Arc<dyn KeyValueStore>) -> Self {
        let mut ledger = Self::empty(day, goals, store);

        match read_json::<MealSlots>(ledger.store.as_ref(), &keys::meals(day)) {
            Ok(Some(meals)) => ledger.meals = meals,
            Ok(None) => {}
            Err(e) => tracing::warn!("Ignoring stored meals for {}: {}", day, e),
        }

        let owns_counters = ledger.owns_counters();
        let fallback = |key| owns_counters.then_some(key);
        ledger.water_intake =
            ledger.read_counter(&keys::water_intake_on(day), fallback(keys::WATER_INTAKE));
        ledger.steps_intake =
            ledger.read_counter(&keys::steps_intake_on(day), fallback(keys::STEPS_INTAKE));

        ledger
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// The meal in `meal_type`, recomputed against the current calorie goal.
    pub fn meal(&self, meal_type: MealType) -> Meal {
        compute_meal(self.meals.get(meal_type).foods(), self.goals.calorie_goal())
    }

    /// All four meals, recomputed against the current calorie goal.
    pub fn meals(&self) -> MealSlots {
        self.meals.recomputed(self.goals.calorie_goal())
    }

    pub fn water_intake(&self) -> u32 {
        self.water_intake
    }

    pub fn steps_intake(&self) -> u32 {
        self.steps_intake
    }

    /// Water still to drink. Negative once the goal is exceeded.
    pub fn remaining_water(&self) -> i64 {
        i64::from(self.goals.water_goal()) - i64::from(self.water_intake)
    }

    /// Steps still to walk. Negative once the goal is exceeded.
    pub fn remaining_steps(&self) -> i64 {
        i64::from(self.goals.steps_goal()) - i64::from(self.steps_intake)
    }

    pub fn add_meal(&mut self, meal_type: MealType, new_foods: Vec<FoodEntry>) -> Meal {
        let calorie_goal = self.goals.calorie_goal();
        let meal =
            aggregator::add_foods_to_meal(self.meals.get(meal_type), new_foods, calorie_goal);
        self.replace_meal(meal_type, meal)
    }

    pub fn change_food_quantity(
        &mut self,
        meal_type: MealType,
        food_id: &str,
        delta: i64,
    ) -> Meal {
        let calorie_goal = self.goals.calorie_goal();
        let meal =
            aggregator::adjust_quantity(self.meals.get(meal_type), food_id, delta, calorie_goal);
        self.replace_meal(meal_type, meal)
    }

    pub fn remove_food(&mut self, meal_type: MealType, food_id: &str) -> Meal {
        let calorie_goal = self.goals.calorie_goal();
        let meal = aggregator::remove_food(self.meals.get(meal_type), food_id, calorie_goal);
        self.replace_meal(meal_type, meal)
    }

    /// Adds user-entered millilitres of water and returns the water remaining.
    pub fn add_water(&mut self, input: &str) -> Result<i64, ValidationError> {
        let amount = parse_amount(input)?;
        self.water_intake = self.water_intake.saturating_add(amount);
        self.persist();
        Ok(self.remaining_water())
    }

    /// Adds user-entered steps and returns the steps remaining.
    pub fn add_steps(&mut self, input: &str) -> Result<i64, ValidationError> {
        let amount = parse_amount(input)?;
        self.steps_intake = self.steps_intake.saturating_add(amount);
        self.persist();
        Ok(self.remaining_steps())
    }

    pub fn total_nutrition(&self) -> NutritionTotals {
        let meals = self.meals();
        aggregator::sum_meals(
            MealType::ALL.iter().map(|slot| meals.get(*slot)),
            self.goals.calorie_goal(),
        )
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            day: self.day,
            meals: self.meals(),
            totals: self.total_nutrition(),
            water_intake: self.water_intake,
            remaining_water: self.remaining_water(),
            steps_intake: self.steps_intake,
            remaining_steps: self.remaining_steps(),
        }
    }

    /// Mirrors the ledger to the store, logging instead of failing.
    pub fn persist(&self) {
        if let Err(e) = self.try_persist() {
            tracing::warn!("Failed to persist ledger for {}: {}", self.day, e);
        }
    }

    fn try_persist(&self) -> Result<(), StorageError> {
        let mut batch = Batch::new();
        batch.put(keys::meals(self.day), &self.meals)?;
        batch.put(keys::water_intake_on(self.day), &self.water_intake)?;
        batch.put(keys::steps_intake_on(self.day), &self.steps_intake)?;

        if self.owns_counters() {
            let calories = self.total_nutrition().total_calories.round() as i64;
            batch.put(keys::CALORIES, &calories)?;
            batch.put(keys::WATER_INTAKE, &self.water_intake)?;
            batch.put(keys::STEPS_INTAKE, &self.steps_intake)?;
            batch.put(keys::REMAINING_WATER, &self.remaining_water())?;
            batch.put(keys::REMAINING_STEPS, &self.remaining_steps())?;
        } else {
            tracing::debug!(
                "Rollover to {} still pending; leaving day counters untouched",
                self.day
            );
        }

        batch.commit(self.store.as_ref())
    }

    fn replace_meal(&mut self, meal_type: MealType, meal: Meal) -> Meal {
        *self.meals.get_mut(meal_type) = meal.clone();
        self.persist();
        meal
    }

    /// True when the day-global counters in the store belong to this ledger.
    fn owns_counters(&self) -> bool {
        match read_json::<String>(self.store.as_ref(), keys::LAST_RESET_DATE) {
            Ok(Some(key)) => parse_day_key(&key) == Some(self.day),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Unreadable {}: {}", keys::LAST_RESET_DATE, e);
                false
            }
        }
    }

    /// Reads `key`, then `fallback` when `key` was never written.
    fn read_counter(&self, key: &str, fallback: Option<&str>) -> u32 {
        let read = |key: &str| match read_json::<u32>(self.store.as_ref(), key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Ignoring stored {}: {}", key, e);
                None
            }
        };
        read(key).or_else(|| fallback.and_then(read)).unwrap_or(0)
    }
}
