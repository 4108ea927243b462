//! In-process fakes shared by unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::backend::{BackendError, BackendGateway, GoalUpdate, GoalsPayload};
use crate::models::{DailySummary, FoodEntry};

/// Backend double that records every call.
pub(crate) struct FakeBackend {
    goals: Mutex<Option<GoalsPayload>>,
    catalog: Mutex<Vec<FoodEntry>>,
    searches: Mutex<Vec<String>>,
    fail_submit: AtomicBool,
    fail_update: AtomicBool,
    yield_on_fetch: AtomicBool,
    fetch_calls: AtomicUsize,
    submissions: Mutex<Vec<DailySummary>>,
    updates: Mutex<Vec<(String, GoalUpdate)>>,
}

impl FakeBackend {
    /// Serves the given goals as JSON numbers.
    pub fn with_goals(weight: u32, steps: u32, calories: u32, water: u32) -> Self {
        Self::with_payload(GoalsPayload {
            goal_weight: Some(weight.into()),
            steps: Some(steps.into()),
            goal_calories: Some(calories.into()),
            water_goal: Some(water.into()),
        })
    }

    pub fn with_payload(payload: GoalsPayload) -> Self {
        Self {
            goals: Mutex::new(Some(payload)),
            catalog: Mutex::new(Vec::new()),
            searches: Mutex::new(Vec::new()),
            fail_submit: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            yield_on_fetch: AtomicBool::new(false),
            fetch_calls: AtomicUsize::new(0),
            submissions: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
        }
    }

    /// Every goal fetch answers with HTTP 503.
    pub fn unreachable() -> Self {
        let backend = Self::with_payload(GoalsPayload::default());
        *backend.goals.lock().unwrap() = None;
        backend
    }

    pub fn set_payload(&self, payload: Option<GoalsPayload>) {
        *self.goals.lock().unwrap() = payload;
    }

    pub fn set_catalog(&self, foods: Vec<FoodEntry>) {
        *self.catalog.lock().unwrap() = foods;
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn set_fail_submit(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    /// Makes goal fetches suspend once before answering.
    pub fn set_yield_on_fetch(&self, yield_once: bool) {
        self.yield_on_fetch.store(yield_once, Ordering::SeqCst);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<DailySummary> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(String, GoalUpdate)> {
        self.updates.lock().unwrap().clone()
    }
}

fn unavailable(url: &str) -> BackendError {
    BackendError::Status {
        url: url.to_string(),
        status: 503,
    }
}

#[async_trait]
impl BackendGateway for FakeBackend {
    async fn search_foods(&self, query: &str) -> Result<Vec<FoodEntry>, BackendError> {
        self.searches.lock().unwrap().push(query.to_string());
        let needle = query.to_lowercase();
        Ok(self
            .catalog
            .lock()
            .unwrap()
            .iter()
            .filter(|food| food.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn fetch_goals(&self, user_id: &str) -> Result<GoalsPayload, BackendError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.yield_on_fetch.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        let payload = self.goals.lock().unwrap().clone();
        payload.ok_or_else(|| unavailable(&format!("/goals/{}", user_id)))
    }

    async fn submit_daily_summary(&self, summary: &DailySummary) -> Result<(), BackendError> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(unavailable("/daily-data"));
        }
        self.submissions.lock().unwrap().push(summary.clone());
        Ok(())
    }

    async fn update_goals(&self, user_id: &str, goals: &GoalUpdate) -> Result<(), BackendError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(unavailable(&format!("/goal_setting/{}", user_id)));
        }
        self.updates
            .lock()
            .unwrap()
            .push((user_id.to_string(), *goals));
        Ok(())
    }
}
