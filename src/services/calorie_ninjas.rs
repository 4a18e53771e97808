use serde::Deserialize;
use thiserror::Error;

use crate::config::LookupConfig;
use crate::models::NutritionItem;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LookupError {
    /// Network failure, timeout or non-2xx status.
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Unexpected(String),
}

/// Trait for text-based nutrition databases.
#[async_trait::async_trait]
pub trait NutritionSource: Send + Sync {
    async fn fetch_items(&self, query: &str) -> Result<Vec<NutritionItem>, LookupError>;
}

#[derive(Debug, Deserialize)]
struct NutritionResponse {
    #[serde(default)]
    items: Vec<NutritionItem>,
}

/// CalorieNinjas `/v1/nutrition` client.
pub struct CalorieNinjasClient {
    api_key: String,
    url: String,
    client: reqwest::Client,
}

impl CalorieNinjasClient {
    pub fn new(api_key: String, config: &LookupConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            api_key,
            url: config.url.clone(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl NutritionSource for CalorieNinjasClient {
    async fn fetch_items(&self, query: &str) -> Result<Vec<NutritionItem>, LookupError> {
        log::info!("🔎 CalorieNinjas lookup: '{}'", query);

        let response = self
            .client
            .get(&self.url)
            .header("X-Api-Key", &self.api_key)
            .query(&[("query", query)])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                log::error!("❌ CalorieNinjas request failed: {}", e);
                LookupError::Transport(e.to_string())
            })?;

        let data: NutritionResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                LookupError::Unexpected(format!("failed to parse response: {}", e))
            } else {
                LookupError::Transport(e.to_string())
            }
        })?;

        log::debug!("📥 CalorieNinjas returned {} items", data.items.len());
        Ok(data.items)
    }
}
