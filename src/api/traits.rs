use crate::api::types::{SearchRequest, SearchResponse};
use anyhow::Result;
use async_trait::async_trait;

/// Backend that answers gym searches.
/// The HTTP client is the production implementation; tests plug in their own.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run one search against the backend
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse>;

    /// Get the name of the backend
    fn backend_name(&self) -> &'static str;
}
