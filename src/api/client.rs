use crate::api::traits::SearchBackend;
use crate::api::types::{SearchRequest, SearchResponse};
use crate::config::ApiConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const SEARCH_PATH: &str = "gyms/search";

/// HTTP client for the directory search API
pub struct HttpSearchBackend {
    client: Client,
    base_url: Url,
}

impl HttpSearchBackend {
    /// Create a client with default configuration (local API)
    pub fn new() -> Result<Self> {
        Self::with_config(ApiConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ApiConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_url()?,
        })
    }

    pub fn search_url(&self) -> Result<Url> {
        self.base_url
            .join(SEARCH_PATH)
            .context("Failed to build search URL")
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let url = self.search_url()?;
        debug!("Searching {} with {:?}", url, request);

        let response = self
            .client
            .get(url)
            .query(request)
            .send()
            .await
            .context("Failed to reach search API")?;

        if !response.status().is_success() {
            warn!("Search API returned status: {}", response.status());
            anyhow::bail!("Search request failed: {}", response.status());
        }

        let body: SearchResponse = response
            .json()
            .await
            .context("Failed to decode search response")?;

        info!(
            "Search returned {} of {} gyms",
            body.items.len(),
            body.total
        );
        Ok(body)
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
