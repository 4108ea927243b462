//! Cached user goals.
//!
//! Goals are replaced wholesale on every successful fetch or save and mirrored
//! to the `@goals` key so a restarted session has them before the next fetch.
//! A failed fetch leaves the previous goals in place.

use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

use crate::backend::{BackendError, BackendGateway, GoalUpdate, GoalsPayload};
use crate::error::{RangeViolation, ValidationError};
use crate::models::{GoalKind, GoalRanges, Goals};
use crate::storage::{keys, read_json, write_json, KeyValueStore};

#[derive(Error, Debug)]
pub enum GoalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Could not reach the goals service: {0}")]
    Fetch(#[from] BackendError),
}

pub struct GoalStore {
    backend: Arc<dyn BackendGateway>,
    store: Arc<dyn KeyValueStore>,
    ranges: GoalRanges,
    current: RwLock<Option<Goals>>,
}

impl GoalStore {
    /// Creates the store, picking up goals cached by an earlier session.
    pub fn new(
        backend: Arc<dyn BackendGateway>,
        store: Arc<dyn KeyValueStore>,
        ranges: GoalRanges,
    ) -> Self {
        let cached = match read_json::<Goals>(store.as_ref(), keys::GOALS) {
            Ok(goals) => goals,
            Err(e) => {
                tracing::warn!("Ignoring cached goals: {}", e);
                None
            }
        };

        Self {
            backend,
            store,
            ranges,
            current: RwLock::new(cached),
        }
    }

    pub fn ranges(&self) -> &GoalRanges {
        &self.ranges
    }

    pub fn current(&self) -> Option<Goals> {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Calorie goal for percentage math; 0 while no goals are known.
    pub fn calorie_goal(&self) -> u32 {
        self.current().map_or(0, |g| g.calories)
    }

    pub fn water_goal(&self) -> u32 {
        self.current().map_or(0, |g| g.water)
    }

    pub fn steps_goal(&self) -> u32 {
        self.current().map_or(0, |g| g.steps)
    }

    /// Fetches the user's goals and replaces the cached ones.
    pub async fn fetch(&self, user_id: &str) -> Result<Goals, GoalError> {
        let payload = self.backend.fetch_goals(user_id).await?;
        let goals = goals_from_payload(&payload)?;

        self.replace(goals);
        tracing::info!(
            calories = goals.calories,
            water = goals.water,
            steps = goals.steps,
            "Fetched goals"
        );
        Ok(goals)
    }

    /// Checks every goal against its range, reporting all violations at once.
    pub fn validate(&self, goals: &Goals) -> Result<(), ValidationError> {
        let violations: Vec<RangeViolation> = [
            (GoalKind::Weight, goals.weight),
            (GoalKind::Steps, goals.steps),
            (GoalKind::Calories, goals.calories),
            (GoalKind::Water, goals.water),
        ]
        .into_iter()
        .filter_map(|(kind, value)| {
            let range = self.ranges.range(kind);
            (!range.contains(value)).then_some(RangeViolation { kind, value, range })
        })
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange(violations))
        }
    }

    /// Validates and submits edited goals, then caches them.
    pub async fn save(&self, user_id: &str, goals: Goals) -> Result<(), GoalError> {
        self.validate(&goals)?;
        self.backend
            .update_goals(user_id, &GoalUpdate::from(&goals))
            .await?;

        self.replace(goals);
        tracing::info!("Saved goals for user {}", user_id);
        Ok(())
    }

    fn replace(&self, goals: Goals) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(goals);
        if let Err(e) = write_json(self.store.as_ref(), keys::GOALS, &goals) {
            tracing::warn!("Failed to cache goals: {}", e);
        }
    }
}

/// Converts a backend payload into goals.
///
/// Steps, calories and water are required. A missing weight reads as 0, but
/// a weight that is present and not numeric is rejected.
pub fn goals_from_payload(payload: &GoalsPayload) -> Result<Goals, ValidationError> {
    let required = |value: &Option<Value>, field: &'static str| {
        value
            .as_ref()
            .and_then(numeric)
            .ok_or(ValidationError::MalformedGoal(field))
    };

    let weight = match &payload.goal_weight {
        None | Some(Value::Null) => 0,
        Some(value) => numeric(value).ok_or(ValidationError::MalformedGoal("goalWeight"))?,
    };

    Ok(Goals {
        weight,
        steps: required(&payload.steps, "steps")?,
        calories: required(&payload.goal_calories, "goalCalories")?,
        water: required(&payload.water_goal, "waterGoal")?,
    })
}

/// Reads a number or numeric string, truncating any fraction.
fn numeric(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if number.is_finite() && (0.0..=f64::from(u32::MAX)).contains(&number) {
        Some(number.trunc() as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::testing::FakeBackend;

    fn goal_store(backend: Arc<FakeBackend>) -> (GoalStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let goals = GoalStore::new(backend, store.clone(), GoalRanges::default());
        (goals, store)
    }

    fn valid_goals() -> Goals {
        Goals {
            weight: 60,
            steps: 8000,
            calories: 2000,
            water: 2000,
        }
    }

    #[test]
    fn test_payload_with_numeric_strings() {
        let payload: GoalsPayload = serde_json::from_str(
            r#"{"goalWeight": "62.5", "steps": "8000", "goalCalories": " 1800 ", "waterGoal": 2000}"#,
        )
        .unwrap();
        let goals = goals_from_payload(&payload).unwrap();
        assert_eq!(
            goals,
            Goals {
                weight: 62,
                steps: 8000,
                calories: 1800,
                water: 2000
            }
        );
    }

    #[test]
    fn test_payload_missing_weight_defaults_to_zero() {
        let payload: GoalsPayload =
            serde_json::from_str(r#"{"steps": 8000, "goalCalories": 2000, "waterGoal": 2000}"#)
                .unwrap();
        assert_eq!(goals_from_payload(&payload).unwrap().weight, 0);
    }

    #[test]
    fn test_payload_rejects_missing_or_bad_required_fields() {
        let missing: GoalsPayload =
            serde_json::from_str(r#"{"steps": 8000, "waterGoal": 2000}"#).unwrap();
        assert_eq!(
            goals_from_payload(&missing),
            Err(ValidationError::MalformedGoal("goalCalories"))
        );

        let text: GoalsPayload = serde_json::from_str(
            r#"{"steps": "lots", "goalCalories": 2000, "waterGoal": 2000}"#,
        )
        .unwrap();
        assert_eq!(
            goals_from_payload(&text),
            Err(ValidationError::MalformedGoal("steps"))
        );

        let negative: GoalsPayload = serde_json::from_str(
            r#"{"steps": 8000, "goalCalories": 2000, "waterGoal": -1}"#,
        )
        .unwrap();
        assert_eq!(
            goals_from_payload(&negative),
            Err(ValidationError::MalformedGoal("waterGoal"))
        );
    }

    #[test]
    fn test_payload_rejects_non_numeric_weight() {
        let payload: GoalsPayload = serde_json::from_str(
            r#"{"goalWeight": true, "steps": 8000, "goalCalories": 2000, "waterGoal": 2000}"#,
        )
        .unwrap();
        assert_eq!(
            goals_from_payload(&payload),
            Err(ValidationError::MalformedGoal("goalWeight"))
        );
    }

    #[test]
    fn test_no_goals_means_zero_calorie_goal() {
        let (goals, _store) = goal_store(Arc::new(FakeBackend::unreachable()));
        assert!(goals.current().is_none());
        assert_eq!(goals.calorie_goal(), 0);
    }

    #[tokio::test]
    async fn test_fetch_replaces_and_caches_goals() {
        let backend = Arc::new(FakeBackend::with_goals(60, 8000, 2000, 2000));
        let (goals, store) = goal_store(backend);

        let fetched = goals.fetch("42").await.unwrap();

        assert_eq!(fetched, valid_goals());
        assert_eq!(goals.calorie_goal(), 2000);
        let cached: Option<Goals> = read_json(store.as_ref(), keys::GOALS).unwrap();
        assert_eq!(cached, Some(valid_goals()));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_goals() {
        let backend = Arc::new(FakeBackend::with_goals(60, 8000, 2000, 2000));
        let (goals, _store) = goal_store(backend.clone());
        goals.fetch("42").await.unwrap();

        backend.set_payload(None);
        assert!(matches!(goals.fetch("42").await, Err(GoalError::Fetch(_))));

        backend.set_payload(Some(GoalsPayload::default()));
        assert!(matches!(
            goals.fetch("42").await,
            Err(GoalError::Validation(_))
        ));

        assert_eq!(goals.current(), Some(valid_goals()));
    }

    #[tokio::test]
    async fn test_new_picks_up_cached_goals() {
        let backend = Arc::new(FakeBackend::with_goals(60, 8000, 2000, 2000));
        let store = Arc::new(MemoryStore::new());
        let first = GoalStore::new(backend.clone(), store.clone(), GoalRanges::default());
        first.fetch("42").await.unwrap();

        let second = GoalStore::new(backend, store, GoalRanges::default());
        assert_eq!(second.current(), Some(valid_goals()));
    }

    #[tokio::test]
    async fn test_save_reports_every_violation() {
        let backend = Arc::new(FakeBackend::with_goals(60, 8000, 2000, 2000));
        let (goals, _store) = goal_store(backend.clone());

        let edited = Goals {
            weight: 30,
            steps: 8000,
            calories: 6000,
            water: 100,
        };
        let err = goals.save("42", edited).await.unwrap_err();

        match err {
            GoalError::Validation(ValidationError::OutOfRange(violations)) => {
                let kinds: Vec<GoalKind> = violations.iter().map(|v| v.kind).collect();
                assert_eq!(
                    kinds,
                    vec![GoalKind::Weight, GoalKind::Calories, GoalKind::Water]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(backend.updates().is_empty());
        assert!(goals.current().is_none());
    }

    #[tokio::test]
    async fn test_save_submits_and_caches() {
        let backend = Arc::new(FakeBackend::with_goals(60, 8000, 2000, 2000));
        let (goals, _store) = goal_store(backend.clone());

        goals.save("42", valid_goals()).await.unwrap();

        let updates = backend.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "42");
        assert_eq!(updates[0].1.goal_calories, 2000);
        assert_eq!(goals.current(), Some(valid_goals()));
    }

    #[tokio::test]
    async fn test_save_failure_keeps_previous_goals() {
        let backend = Arc::new(FakeBackend::with_goals(60, 8000, 2000, 2000));
        backend.set_fail_update(true);
        let (goals, _store) = goal_store(backend);

        assert!(matches!(
            goals.save("42", valid_goals()).await,
            Err(GoalError::Fetch(_))
        ));
        assert!(goals.current().is_none());
    }
}
