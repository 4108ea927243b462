//! A user's working session: goals, today's ledger and the rollover manager
//! wired to one store and one backend.

use chrono::NaiveDateTime;
use std::sync::Arc;

use crate::backend::{BackendError, BackendGateway};
use crate::goal_store::{GoalError, GoalStore};
use crate::ledger::DailyLedger;
use crate::logical_day::logical_day;
use crate::models::{FoodEntry, GoalRanges, Goals};
use crate::rollover::{DayRolloverManager, RolloverError, RolloverOutcome};
use crate::storage::KeyValueStore;

pub struct Session {
    user_id: String,
    store: Arc<dyn KeyValueStore>,
    backend: Arc<dyn BackendGateway>,
    goals: Arc<GoalStore>,
    rollover: DayRolloverManager,
    ledger: DailyLedger,
}

impl Session {
    /// Opens a session positioned on the logical day of `now`.
    ///
    /// No rollover happens here; call [`Session::refresh`] before trusting
    /// the day-global counters.
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn BackendGateway>,
        ranges: GoalRanges,
        now: NaiveDateTime,
    ) -> Self {
        let user_id = user_id.into();
        let goals = Arc::new(GoalStore::new(backend.clone(), store.clone(), ranges));
        let rollover = DayRolloverManager::new(
            user_id.clone(),
            store.clone(),
            backend.clone(),
            goals.clone(),
        );
        let ledger = DailyLedger::load(logical_day(now), goals.clone(), store.clone());

        Self {
            user_id,
            store,
            backend,
            goals,
            rollover,
            ledger,
        }
    }

    pub fn ledger(&self) -> &DailyLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut DailyLedger {
        &mut self.ledger
    }

    pub fn goals(&self) -> &GoalStore {
        &self.goals
    }

    /// Runs the rollover check and moves the ledger onto the current day.
    pub async fn refresh(&mut self, now: NaiveDateTime) -> Result<RolloverOutcome, RolloverError> {
        let outcome = self.rollover.check(now).await?;

        match &outcome {
            RolloverOutcome::RolledOver(report) if self.ledger.day() == report.new_day => {
                // Entries logged while the rollover was pending now own the counters.
                self.ledger.persist();
            }
            RolloverOutcome::RolledOver(report) => self.switch_to(report.new_day),
            RolloverOutcome::SameDay(day) if self.ledger.day() != *day => self.switch_to(*day),
            RolloverOutcome::SameDay(_) | RolloverOutcome::InFlight => {}
        }

        Ok(outcome)
    }

    /// Fetches fresh goals and re-persists the remaining counters.
    pub async fn fetch_goals(&mut self) -> Result<Goals, GoalError> {
        let goals = self.goals.fetch(&self.user_id).await?;
        self.ledger.persist();
        Ok(goals)
    }

    /// Validates and saves edited goals.
    pub async fn save_goals(&mut self, goals: Goals) -> Result<(), GoalError> {
        self.goals.save(&self.user_id, goals).await?;
        self.ledger.persist();
        Ok(())
    }

    /// Searches the food catalog. Results are ready to pass to
    /// [`DailyLedger::add_meal`].
    pub async fn search_foods(&self, query: &str) -> Result<Vec<FoodEntry>, BackendError> {
        self.backend.search_foods(query.trim()).await
    }

    fn switch_to(&mut self, day: chrono::NaiveDate) {
        tracing::debug!("Switching ledger from {} to {}", self.ledger.day(), day);
        self.ledger = DailyLedger::load(day, self.goals.clone(), self.store.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical_day::day_key;
    use crate::models::MealType;
    use crate::rollover::Submission;
    use crate::storage::{keys, read_json, write_json, MemoryStore};
    use crate::testing::FakeBackend;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn session(now: NaiveDateTime) -> (Session, Arc<MemoryStore>, Arc<FakeBackend>) {
        let store = Arc::new(MemoryStore::new());
        let backend = Arc::new(FakeBackend::with_goals(60, 8000, 2000, 2000));
        let session = Session::new(
            "42",
            store.clone(),
            backend.clone(),
            GoalRanges::default(),
            now,
        );
        (session, store, backend)
    }

    #[tokio::test]
    async fn test_first_refresh_starts_the_day() {
        let (mut session, store, backend) = session(at(2024, 3, 2, 9));

        let outcome = session.refresh(at(2024, 3, 2, 9)).await.unwrap();

        assert!(matches!(outcome, RolloverOutcome::RolledOver(_)));
        assert!(backend.submissions().is_empty());
        assert_eq!(session.ledger().remaining_water(), 2000);
        let remaining: Option<i64> = read_json(store.as_ref(), keys::REMAINING_STEPS).unwrap();
        assert_eq!(remaining, Some(8000));
    }

    #[tokio::test]
    async fn test_entries_logged_before_rollover_are_kept() {
        let (mut session, store, backend) = session(at(2024, 3, 2, 9));
        let yesterday = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        write_json(store.as_ref(), keys::LAST_RESET_DATE, &day_key(yesterday)).unwrap();
        write_json(store.as_ref(), keys::WATER_INTAKE, &1900u32).unwrap();
        write_json(store.as_ref(), keys::CALORIES, &1800i64).unwrap();

        session
            .ledger_mut()
            .add_meal(MealType::Breakfast, vec![FoodEntry::new("oats", 300.0)]);
        session.ledger_mut().add_water("250").unwrap();

        session.refresh(at(2024, 3, 2, 9)).await.unwrap();

        let sent = backend.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].calories, 1800);
        assert_eq!(sent[0].water_intake, 1900);

        assert_eq!(session.ledger().water_intake(), 250);
        let calories: Option<i64> = read_json(store.as_ref(), keys::CALORIES).unwrap();
        assert_eq!(calories, Some(300));
        let water: Option<u32> = read_json(store.as_ref(), keys::WATER_INTAKE).unwrap();
        assert_eq!(water, Some(250));
    }

    #[tokio::test]
    async fn test_day_change_during_session() {
        let (mut session, _store, backend) = session(at(2024, 3, 2, 9));
        session.refresh(at(2024, 3, 2, 9)).await.unwrap();
        session
            .ledger_mut()
            .add_meal(MealType::Dinner, vec![FoodEntry::new("pasta", 700.0)]);
        session.ledger_mut().add_steps("6500").unwrap();

        session.refresh(at(2024, 3, 3, 7)).await.unwrap();

        let sent = backend.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].calories, 700);
        assert_eq!(sent[0].steps, 6500);
        assert_eq!(
            session.ledger().day(),
            NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()
        );
        assert!(session.ledger().meal(MealType::Dinner).is_empty());
        assert_eq!(session.ledger().steps_intake(), 0);
    }

    #[tokio::test]
    async fn test_failed_rollover_keeps_ledger() {
        let (mut session, store, backend) = session(at(2024, 3, 2, 9));
        session.refresh(at(2024, 3, 2, 9)).await.unwrap();
        session.ledger_mut().add_water("800").unwrap();
        backend.set_payload(None);

        let result = session.refresh(at(2024, 3, 3, 9)).await;

        assert!(matches!(result, Err(RolloverError::Goals(_))));
        assert_eq!(session.ledger().water_intake(), 800);
        let water: Option<u32> = read_json(store.as_ref(), keys::WATER_INTAKE).unwrap();
        assert_eq!(water, Some(800));
    }

    #[tokio::test]
    async fn test_counters_logged_during_outage_survive_restart() {
        let store = Arc::new(MemoryStore::new());
        let backend = Arc::new(FakeBackend::with_goals(60, 8000, 2000, 2000));
        write_json(store.as_ref(), keys::LAST_RESET_DATE, &"2024-03-01").unwrap();
        write_json(store.as_ref(), keys::WATER_INTAKE, &1900u32).unwrap();
        backend.set_payload(None);
        let now = at(2024, 3, 2, 9);

        let mut offline = Session::new(
            "42",
            store.clone(),
            backend.clone(),
            GoalRanges::default(),
            now,
        );
        assert!(offline.refresh(now).await.is_err());
        offline.ledger_mut().add_water("500").unwrap();
        offline.ledger_mut().add_steps("3000").unwrap();
        drop(offline);

        let mut restarted = Session::new(
            "42",
            store.clone(),
            backend.clone(),
            GoalRanges::default(),
            now,
        );
        assert_eq!(restarted.ledger().water_intake(), 500);
        assert_eq!(restarted.ledger().steps_intake(), 3000);

        backend.set_payload(
            serde_json::from_str(
                r#"{"goalWeight": 60, "steps": 8000, "goalCalories": 2000, "waterGoal": 2000}"#,
            )
            .unwrap(),
        );
        restarted.refresh(now).await.unwrap();

        assert_eq!(backend.submissions()[0].water_intake, 1900);
        assert_eq!(restarted.ledger().water_intake(), 500);
        let water: Option<u32> = read_json(store.as_ref(), keys::WATER_INTAKE).unwrap();
        assert_eq!(water, Some(500));
        let remaining: Option<i64> = read_json(store.as_ref(), keys::REMAINING_STEPS).unwrap();
        assert_eq!(remaining, Some(5000));
    }

    #[tokio::test]
    async fn test_search_foods_trims_query() {
        let (session, _store, backend) = session(at(2024, 3, 2, 9));
        backend.set_catalog(vec![FoodEntry::new("Banana", 105.0)]);

        let found = session.search_foods("  ban ").await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Banana");
        assert_eq!(backend.searches(), vec!["ban".to_string()]);
    }

    #[tokio::test]
    async fn test_save_goals_updates_remaining() {
        let (mut session, store, _backend) = session(at(2024, 3, 2, 9));
        session.refresh(at(2024, 3, 2, 9)).await.unwrap();
        session.ledger_mut().add_water("500").unwrap();

        session
            .save_goals(Goals {
                weight: 60,
                steps: 10000,
                calories: 2200,
                water: 3000,
            })
            .await
            .unwrap();

        assert_eq!(session.ledger().remaining_water(), 2500);
        let remaining: Option<i64> = read_json(store.as_ref(), keys::REMAINING_WATER).unwrap();
        assert_eq!(remaining, Some(2500));
    }

    #[tokio::test]
    async fn test_submission_failure_reported() {
        let (mut session, store, backend) = session(at(2024, 3, 2, 9));
        write_json(store.as_ref(), keys::LAST_RESET_DATE, &"2024-03-01").unwrap();
        backend.set_fail_submit(true);

        match session.refresh(at(2024, 3, 2, 9)).await.unwrap() {
            RolloverOutcome::RolledOver(report) => {
                assert!(matches!(report.submission, Submission::Failed { .. }));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
