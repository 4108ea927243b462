//! Logical-day rollover.
//!
//! When the current logical day differs from the persisted `lastResetDate`,
//! the previous day is closed out in a fixed order:
//!
//! 1. fetch fresh goals (a failure stops here and keeps the old day intact)
//! 2. read the previous day's persisted totals
//! 3. submit them to the backend (a failure is logged, not fatal)
//! 4. clear the persisted day and stamp the new `lastResetDate`
//!
//! A successful submission is recorded under `lastSubmittedDate` before the
//! reset, so a retry after an interruption between steps 3 and 4 does not
//! submit the same day twice.

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use crate::backend::BackendGateway;
use crate::goal_store::{GoalError, GoalStore};
use crate::logical_day::{day_key, logical_day, parse_day_key};
use crate::models::{DailySummary, Goals};
use crate::storage::{keys, read_json, write_json, Batch, KeyValueStore, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverState {
    Unchecked,
    SameDay,
    RolledOver,
}

/// What happened to the previous day's totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Submission {
    Sent(DailySummary),
    /// Sent by an earlier, interrupted rollover.
    AlreadySent(NaiveDate),
    /// First run; there is no previous day to report.
    NoPreviousDay,
    Failed {
        summary: DailySummary,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloverReport {
    pub previous_day: Option<NaiveDate>,
    pub new_day: NaiveDate,
    pub goals: Goals,
    pub submission: Submission,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum RolloverOutcome {
    SameDay(NaiveDate),
    RolledOver(RolloverReport),
    /// Another check was already running; this one did nothing.
    InFlight,
}

#[derive(Error, Debug)]
pub enum RolloverError {
    #[error("Could not refresh goals, keeping the previous day: {0}")]
    Goals(#[from] GoalError),

    #[error("Storage error during rollover: {0}")]
    Storage(#[from] StorageError),
}

/// Totals persisted by the ledger for the day being closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PersistedTotals {
    calories: i64,
    water: u32,
    steps: u32,
}

pub struct DayRolloverManager {
    user_id: String,
    store: Arc<dyn KeyValueStore>,
    backend: Arc<dyn BackendGateway>,
    goals: Arc<GoalStore>,
    state: Mutex<RolloverState>,
    in_flight: AtomicBool,
}

impl DayRolloverManager {
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn BackendGateway>,
        goals: Arc<GoalStore>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            store,
            backend,
            goals,
            state: Mutex::new(RolloverState::Unchecked),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> RolloverState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The logical day of the last completed rollover, if any.
    pub fn last_reset_day(&self) -> Result<Option<NaiveDate>, StorageError> {
        let stored: Option<String> = read_json(self.store.as_ref(), keys::LAST_RESET_DATE)?;
        Ok(stored.and_then(|key| {
            let day = parse_day_key(&key);
            if day.is_none() {
                tracing::warn!("Ignoring malformed {} '{}'", keys::LAST_RESET_DATE, key);
            }
            day
        }))
    }

    /// Compares the logical day of `now` with the last rollover and closes
    /// out the previous day when they differ.
    ///
    /// Calls that overlap a running check return [`RolloverOutcome::InFlight`].
    pub async fn check(&self, now: NaiveDateTime) -> Result<RolloverOutcome, RolloverError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("Rollover check already running; skipping");
            return Ok(RolloverOutcome::InFlight);
        };

        let today = logical_day(now);
        let previous_day = self.last_reset_day()?;

        if previous_day == Some(today) {
            self.set_state(RolloverState::SameDay);
            return Ok(RolloverOutcome::SameDay(today));
        }

        tracing::info!(
            "Rolling over from {} to {}",
            previous_day.map_or_else(|| "nothing".to_string(), day_key),
            today
        );

        let goals = self.goals.fetch(&self.user_id).await?;
        let totals = self.read_totals();
        let submission = match previous_day {
            Some(day) => self.submit(day, totals).await?,
            None => Submission::NoPreviousDay,
        };
        self.reset(previous_day, today, &goals)?;

        self.set_state(RolloverState::RolledOver);
        Ok(RolloverOutcome::RolledOver(RolloverReport {
            previous_day,
            new_day: today,
            goals,
            submission,
        }))
    }

    fn read_totals(&self) -> PersistedTotals {
        PersistedTotals {
            calories: self.read_or_zero(keys::CALORIES),
            water: self.read_or_zero(keys::WATER_INTAKE),
            steps: self.read_or_zero(keys::STEPS_INTAKE),
        }
    }

    fn read_or_zero<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match read_json(self.store.as_ref(), key) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Treating unreadable {} as zero: {}", key, e);
                T::default()
            }
        }
    }

    async fn submit(
        &self,
        day: NaiveDate,
        totals: PersistedTotals,
    ) -> Result<Submission, StorageError> {
        let already_sent: Option<String> =
            read_json(self.store.as_ref(), keys::LAST_SUBMITTED_DATE)?;
        if already_sent.as_deref().and_then(parse_day_key) == Some(day) {
            tracing::info!("Totals for {} were already submitted", day);
            return Ok(Submission::AlreadySent(day));
        }

        let summary = DailySummary {
            user_id: self.user_id.clone(),
            log_date: day,
            calories: totals.calories,
            water_intake: totals.water,
            steps: totals.steps,
        };

        match self.backend.submit_daily_summary(&summary).await {
            Ok(()) => {
                write_json(self.store.as_ref(), keys::LAST_SUBMITTED_DATE, &day_key(day))?;
                tracing::info!(
                    calories = summary.calories,
                    water = summary.water_intake,
                    steps = summary.steps,
                    "Submitted totals for {}",
                    day
                );
                Ok(Submission::Sent(summary))
            }
            Err(e) => {
                tracing::warn!("Failed to submit totals for {}: {}", day, e);
                Ok(Submission::Failed {
                    summary,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn reset(
        &self,
        previous_day: Option<NaiveDate>,
        today: NaiveDate,
        goals: &Goals,
    ) -> Result<(), StorageError> {
        let mut batch = Batch::new();

        if let Some(day) = previous_day {
            batch.remove(keys::meals(day));
            batch.remove(keys::water_intake_on(day));
            batch.remove(keys::steps_intake_on(day));
        }
        batch.put(keys::CALORIES, &0i64)?;
        batch.put(keys::WATER_INTAKE, &0u32)?;
        batch.put(keys::STEPS_INTAKE, &0u32)?;
        batch.put(keys::REMAINING_WATER, &i64::from(goals.water))?;
        batch.put(keys::REMAINING_STEPS, &i64::from(goals.steps))?;
        batch.put(keys::LAST_RESET_DATE, &day_key(today))?;
        batch.commit(self.store.as_ref())
    }

    fn set_state(&self, state: RolloverState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

/// Holds the in-flight flag for the duration of one check.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
