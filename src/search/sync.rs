use crate::search::codec;
use crate::search::history::NavigationSink;
use crate::search::planner::{plan_navigation, HistoryMode, NavigationPlan};
use crate::search::store::SearchStore;
use tracing::{debug, info, warn};

/// Lifecycle of a [`UrlSync`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Not mounted, or no browsing context was available at mount
    Uninitialized,
    /// Store populated from the URL, nothing written yet
    Hydrated,
    /// At least one store change has been written to the URL
    Syncing,
}

/// Which direction is currently being applied.
///
/// Both directions run inside a single `&mut self` call, so exclusive
/// borrowing already keeps them from interleaving; the phase records the
/// direction for the duration of that call and is back to `Idle` whenever
/// a caller can observe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    ApplyingFromUrl,
    ApplyingToUrl,
}

/// Binds a [`SearchStore`] to session history.
///
/// `mount` hydrates the store from the current location, `handle_pop_state`
/// follows back/forward moves, and `dispatch` runs a store action and writes
/// the result to the URL with the mode the store asked for.
pub struct UrlSync<S: NavigationSink> {
    store: SearchStore,
    sink: S,
    state: SyncState,
    phase: SyncPhase,
    baseline: Option<String>,
    seen_revision: u64,
    listening: bool,
}

impl<S: NavigationSink> UrlSync<S> {
    pub fn new(store: SearchStore, sink: S) -> Self {
        let seen_revision = store.revision();
        Self {
            store,
            sink,
            state: SyncState::Uninitialized,
            phase: SyncPhase::Idle,
            baseline: None,
            seen_revision,
            listening: false,
        }
    }

    /// Hydrate from the current location and start following pop events.
    ///
    /// Returns false when there is no location yet; call again once there is.
    pub fn mount(&mut self) -> bool {
        if self.state != SyncState::Uninitialized {
            return true;
        }
        let Some(location) = self.sink.location() else {
            debug!("No location available, staying uninitialized");
            return false;
        };

        let href = location.href();
        self.store.hydrate_from_url(&href);
        self.store.mark_url_synced(&location.search);
        self.baseline = Some(location.search);
        self.seen_revision = self.store.revision();
        self.listening = true;
        self.state = SyncState::Hydrated;
        info!("Hydrated search state from {}", href);
        true
    }

    /// React to a back/forward move: the sink already points at the new entry.
    pub fn handle_pop_state(&mut self) -> bool {
        if !self.listening {
            debug!("Ignoring history event while not mounted");
            return false;
        }
        let Some(location) = self.sink.location() else {
            warn!("History event without a location, ignoring");
            return false;
        };
        debug_assert_eq!(self.phase, SyncPhase::Idle);

        let href = location.href();
        self.phase = SyncPhase::ApplyingFromUrl;
        self.store.apply_url_state(&href);
        self.store.mark_url_synced(&location.search);
        self.baseline = Some(location.search);
        self.seen_revision = self.store.revision();
        self.phase = SyncPhase::Idle;

        debug!("Restored search state from {}", href);
        true
    }

    /// Run a store action, then write the outcome to the URL.
    pub fn dispatch<F, R>(&mut self, action: F) -> R
    where
        F: FnOnce(&mut SearchStore) -> R,
    {
        let result = action(&mut self.store);
        self.sync_to_url();
        result
    }

    /// Write the store to the URL if it changed since the last sync.
    ///
    /// Returns the plan that was executed, if any.
    pub fn sync_to_url(&mut self) -> Option<NavigationPlan> {
        if self.state == SyncState::Uninitialized || !self.store.is_hydrated() {
            return None;
        }
        if self.store.revision() == self.seen_revision {
            return None;
        }
        self.seen_revision = self.store.revision();

        let next = codec::encode(self.store.filters());
        let baseline = self.baseline.clone().unwrap_or_default();
        if next == baseline {
            self.store.mark_url_synced(&next);
            return None;
        }

        let pathname = self.sink.location().map(|location| location.pathname);
        let plan = plan_navigation(
            pathname.as_deref(),
            &baseline,
            &next,
            self.store.pending_history(),
        );
        let Some(url) = plan.url.as_deref().filter(|_| plan.should_navigate) else {
            return None;
        };

        debug_assert_eq!(self.phase, SyncPhase::Idle);
        self.phase = SyncPhase::ApplyingToUrl;
        match plan.mode {
            HistoryMode::Push => self.sink.push(url),
            HistoryMode::Replace => self.sink.replace(url),
        }
        self.store.mark_url_synced(&next);
        self.baseline = Some(next);
        self.state = SyncState::Syncing;
        self.phase = SyncPhase::Idle;

        debug!("Wrote {:?} {}", plan.mode, url);
        Some(plan)
    }

    pub fn store(&self) -> &SearchStore {
        &self.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Direct access to the sink, e.g. to move through history before
    /// calling [`UrlSync::handle_pop_state`]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Query last known to be in the address bar
    pub fn baseline(&self) -> Option<&str> {
        self.baseline.as_deref()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Stop following history and hand back the parts.
    pub fn dispose(mut self) -> (SearchStore, S) {
        self.listening = false;
        info!("URL sync disposed");
        (self.store, self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortOrder;
    use crate::search::history::MemoryHistory;

    fn mounted(url: &str) -> UrlSync<MemoryHistory> {
        let mut sync = UrlSync::new(SearchStore::new(), MemoryHistory::new(url));
        assert!(sync.mount());
        sync
    }

    #[test]
    fn mount_hydrates_without_writing() {
        let sync = mounted("/gyms?pref=tokyo&sort=name");
        assert_eq!(sync.state(), SyncState::Hydrated);
        assert_eq!(sync.store().filters().sort, SortOrder::Name);
        assert_eq!(sync.baseline(), Some("pref=tokyo&sort=name"));
        assert!(sync.sink().writes().is_empty());
    }

    #[test]
    fn mount_waits_for_a_location() {
        let mut sync = UrlSync::new(SearchStore::new(), MemoryHistory::detached());
        assert!(!sync.mount());
        assert_eq!(sync.state(), SyncState::Uninitialized);
        assert!(!sync.handle_pop_state());

        sync.dispatch(|store| store.update_keyword("yoga"));
        assert!(sync.sink().writes().is_empty());
    }

    #[test]
    fn filter_change_pushes_and_paging_replaces() {
        let mut sync = mounted("/gyms");
        sync.dispatch(|store| store.update_prefecture(Some("tokyo")));
        sync.dispatch(|store| store.set_page(2));

        assert_eq!(
            sync.sink().writes(),
            &[
                (HistoryMode::Push, "/gyms?pref=tokyo".to_string()),
                (HistoryMode::Replace, "/gyms?pref=tokyo&page=2".to_string()),
            ]
        );
        assert_eq!(sync.sink().len(), 2);
        assert_eq!(sync.state(), SyncState::Syncing);
    }

    #[test]
    fn unchanged_dispatch_writes_nothing() {
        let mut sync = mounted("/gyms?q=yoga");
        sync.dispatch(|store| store.submit_search("yoga"));
        assert!(sync.sink().writes().is_empty());
        assert!(sync.sync_to_url().is_none());
    }

    #[test]
    fn pop_state_restores_without_writing() {
        let mut sync = mounted("/gyms?pref=tokyo");
        sync.dispatch(|store| store.update_sort(SortOrder::Name));

        sync.sink_mut().back();
        assert!(sync.handle_pop_state());
        assert_eq!(sync.store().filters().sort, SortOrder::Relevance);
        assert_eq!(sync.phase(), SyncPhase::Idle);
        assert!(sync.sync_to_url().is_none());
        assert_eq!(sync.sink().writes().len(), 1);
    }

    #[test]
    fn phase_returns_to_idle_after_each_direction() {
        let mut sync = mounted("/gyms");
        assert!(sync.dispatch(|store| store.update_keyword("sauna")));
        assert_eq!(sync.phase(), SyncPhase::Idle);

        sync.sink_mut().back();
        assert!(sync.handle_pop_state());
        assert_eq!(sync.phase(), SyncPhase::Idle);
        assert_eq!(sync.store().filters().keyword, "");
    }

    #[test]
    fn push_then_paging_in_one_dispatch_still_pushes() {
        let mut sync = mounted("/gyms?pref=tokyo");
        sync.dispatch(|store| {
            store.update_sort(SortOrder::Name);
            store.set_page(2);
        });
        assert_eq!(
            sync.sink().writes(),
            &[(HistoryMode::Push, "/gyms?pref=tokyo&sort=name&page=2".to_string())]
        );
        assert_eq!(sync.sink().len(), 2);
    }

    #[test]
    fn dispose_stops_listening() {
        let sync = mounted("/gyms");
        assert!(sync.is_listening());
        let (store, history) = sync.dispose();
        assert!(store.is_hydrated());
        assert_eq!(history.len(), 1);
    }
}
