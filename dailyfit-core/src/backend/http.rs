use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};

use super::{BackendError, BackendGateway, CatalogFood, GoalUpdate, GoalsPayload};
use crate::models::{DailySummary, FoodEntry};

/// reqwest-based backend client.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    api_token: Option<String>,
    client: Client,
}

impl HttpBackend {
    /// Creates a client for `base_url`, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let base = if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else {
            format!("http://{}", base)
        };
        format!("{}{}", base, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(BackendError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl BackendGateway for HttpBackend {
    async fn search_foods(&self, query: &str) -> Result<Vec<FoodEntry>, BackendError> {
        let url = self.url("/food_data");
        let request = self.client.get(&url).query(&[("name", query)]);
        let response = self.send(&url, request).await?;

        let rows: Vec<CatalogFood> = response.json().await.map_err(|e| BackendError::Decode {
            url,
            message: e.to_string(),
        })?;
        Ok(rows.into_iter().map(FoodEntry::from).collect())
    }

    async fn fetch_goals(&self, user_id: &str) -> Result<GoalsPayload, BackendError> {
        let url = self.url(&format!("/goals/{}", user_id));
        let response = self.send(&url, self.client.get(&url)).await?;

        response.json().await.map_err(|e| BackendError::Decode {
            url,
            message: e.to_string(),
        })
    }

    async fn submit_daily_summary(&self, summary: &DailySummary) -> Result<(), BackendError> {
        let url = self.url("/daily-data");
        self.send(&url, self.client.post(&url).json(summary)).await?;
        Ok(())
    }

    async fn update_goals(&self, user_id: &str, goals: &GoalUpdate) -> Result<(), BackendError> {
        let url = self.url(&format!("/goal_setting/{}", user_id));
        self.send(&url, self.client.patch(&url).json(goals)).await?;
        Ok(())
    }
}
