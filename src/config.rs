//! Backend connection settings.
//!
//! Environment variables:
//! - `GYM_FINDER_API_URL` - base URL of the directory API
//! - `GYM_FINDER_TIMEOUT_SECONDS` - request timeout
//! - `GYM_FINDER_USER_AGENT` - user agent sent with every request

use anyhow::{bail, Context, Result};
use std::env;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: format!("gym-finder/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unusable values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        Self {
            base_url: lookup("GYM_FINDER_API_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(default.base_url),
            timeout_seconds: lookup("GYM_FINDER_TIMEOUT_SECONDS")
                .and_then(|s| s.trim().parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(default.timeout_seconds),
            user_agent: lookup("GYM_FINDER_USER_AGENT")
                .filter(|agent| !agent.trim().is_empty())
                .unwrap_or(default.user_agent),
        }
    }

    /// Parsed base URL, always ending in `/` so endpoints join below it.
    pub fn api_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.base_url))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Unsupported API URL scheme: {}", url.scheme());
        }
        if self.timeout_seconds == 0 {
            bail!("Timeout must be at least one second");
        }
        Ok(())
    }
}
