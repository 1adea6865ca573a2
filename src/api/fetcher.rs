use crate::api::traits::SearchBackend;
use crate::api::types::{SearchRequest, SearchResponse};
use crate::models::{Gym, SearchFilters, SearchMeta};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What the view renders for the current filters
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    pub items: Vec<Gym>,
    pub meta: Option<SearchMeta>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Filters the state above belongs to
    pub filters: Option<SearchFilters>,
}

/// Follows the search store and keeps a [`FetchState`] up to date.
///
/// Each change of the filters starts a new search. A search still running
/// when the filters change again is dropped, so its result can never
/// overwrite the newer one.
pub struct SearchFetcher {
    state: watch::Receiver<FetchState>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl SearchFetcher {
    pub fn spawn<B>(backend: Arc<B>, filters: watch::Receiver<SearchFilters>) -> Self
    where
        B: SearchBackend + ?Sized + 'static,
    {
        let (publisher, state) = watch::channel(FetchState::default());
        let shutdown = CancellationToken::new();
        info!("Starting search fetcher on {} backend", backend.backend_name());
        let task = tokio::spawn(run(backend, filters, publisher, shutdown.clone()));
        Self {
            state,
            shutdown,
            task,
        }
    }

    pub fn state(&self) -> watch::Receiver<FetchState> {
        self.state.clone()
    }

    /// Snapshot of the current state
    pub fn current(&self) -> FetchState {
        self.state.borrow().clone()
    }

    /// Wait until the search for the latest filters has settled.
    pub async fn settled(&self) -> FetchState {
        let mut state = self.state.clone();
        let settled = state
            .wait_for(|state| !state.is_loading && state.filters.is_some())
            .await
            .map(|settled| (*settled).clone());
        settled.unwrap_or_else(|_| self.current())
    }

    /// Cancel any running search and stop following the store.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            warn!("Search fetcher task ended abnormally: {}", e);
        }
    }
}

async fn run<B>(
    backend: Arc<B>,
    mut filters: watch::Receiver<SearchFilters>,
    publisher: watch::Sender<FetchState>,
    shutdown: CancellationToken,
) where
    B: SearchBackend + ?Sized,
{
    loop {
        let current = filters.borrow_and_update().clone();
        let request = SearchRequest::from(&current);
        publisher.send_modify(|state| {
            state.items.clear();
            state.meta = None;
            state.is_loading = true;
            state.error = None;
            state.filters = Some(current.clone());
        });

        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = filters.changed() => {
                if changed.is_err() {
                    break;
                }
                debug!("Filters changed, abandoning search in flight");
                continue;
            }
            result = backend.search(&request) => publish(&publisher, result),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = filters.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    publisher.send_modify(|state| state.is_loading = false);
    debug!("Search fetcher stopped");
}

fn publish(publisher: &watch::Sender<FetchState>, result: Result<SearchResponse>) {
    publisher.send_modify(|state| {
        state.is_loading = false;
        match result {
            Ok(response) => {
                state.meta = Some(response.meta());
                state.items = response.items;
                state.error = None;
            }
            Err(e) => {
                warn!("Search failed: {:#}", e);
                state.error = Some(format!("{:#}", e));
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::store::SearchStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers instantly with one gym named after the keyword, except for
    /// "slow" which never returns and "broken" which fails
    #[derive(Default)]
    struct ScriptedBackend {
        completed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchBackend for ScriptedBackend {
        async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
            let keyword = request.q.clone().unwrap_or_default();
            if keyword == "slow" {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if keyword == "broken" {
                anyhow::bail!("backend unavailable");
            }
            self.completed.lock().unwrap().push(keyword.clone());
            let gym: Gym = serde_json::from_value(serde_json::json!({
                "id": 1,
                "slug": keyword,
                "name": keyword,
            }))?;
            Ok(SearchResponse {
                items: vec![gym],
                total: keyword.len() as u64,
                has_next: false,
                page_token: None,
            })
        }

        fn backend_name(&self) -> &'static str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn superseded_search_never_publishes() {
        let backend = Arc::new(ScriptedBackend::default());
        let mut store = SearchStore::new();
        store.hydrate_from_url("?q=slow");
        let fetcher = SearchFetcher::spawn(backend.clone(), store.subscribe());

        tokio::task::yield_now().await;
        store.update_keyword("fast");

        let state = tokio::time::timeout(Duration::from_secs(5), async {
            let mut rx = fetcher.state();
            let state = rx
                .wait_for(|s| !s.is_loading && s.meta.is_some())
                .await
                .map(|s| (*s).clone());
            state
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(state.filters.unwrap().keyword, "fast");
        assert_eq!(state.meta.unwrap().total, 4);
        assert_eq!(*backend.completed.lock().unwrap(), vec!["fast".to_string()]);
        fetcher.shutdown().await;
    }

    #[tokio::test]
    async fn errors_are_exposed_as_state() {
        let backend = Arc::new(ScriptedBackend::default());
        let mut store = SearchStore::new();
        store.hydrate_from_url("?q=broken");
        let fetcher = SearchFetcher::spawn(backend, store.subscribe());

        let state = tokio::time::timeout(Duration::from_secs(5), fetcher.settled())
            .await
            .unwrap();
        assert!(state.error.unwrap().contains("backend unavailable"));
        assert!(state.items.is_empty());
        fetcher.shutdown().await;
    }

    #[tokio::test]
    async fn failure_after_success_drops_previous_results() {
        let backend = Arc::new(ScriptedBackend::default());
        let mut store = SearchStore::new();
        store.hydrate_from_url("?q=ok");
        let fetcher = SearchFetcher::spawn(backend, store.subscribe());

        let first = tokio::time::timeout(Duration::from_secs(5), fetcher.settled())
            .await
            .unwrap();
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.items[0].slug, "ok");

        store.update_keyword("broken");
        let state = tokio::time::timeout(Duration::from_secs(5), async {
            let mut rx = fetcher.state();
            let state = rx
                .wait_for(|s| !s.is_loading && s.error.is_some())
                .await
                .map(|s| (*s).clone());
            state
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(state.filters.unwrap().keyword, "broken");
        assert!(state.items.is_empty());
        assert!(state.meta.is_none());
        fetcher.shutdown().await;
    }

    #[tokio::test]
    async fn stops_when_store_is_disposed() {
        let backend = Arc::new(ScriptedBackend::default());
        let store = SearchStore::new();
        let fetcher = SearchFetcher::spawn(backend, store.subscribe());
        fetcher.settled().await;

        store.dispose();
        tokio::time::timeout(Duration::from_secs(5), fetcher.shutdown())
            .await
            .unwrap();
    }
}
