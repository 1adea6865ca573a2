use crate::models::{clamp_limit, clamp_page, GeoFilter, SearchFilters, SortOrder};
use crate::search::codec;
use crate::search::planner::HistoryMode;
use tokio::sync::watch;
use tracing::debug;

/// Single source of truth for the current search.
///
/// Every setter is total: bad input is clamped or defaulted, never rejected.
/// Changes to the filters are published on a watch channel so the data
/// fetcher (or any other view) can follow along without polling.
pub struct SearchStore {
    filters: SearchFilters,
    pending_history: HistoryMode,
    hydrated: bool,
    synced_query: Option<String>,
    revision: u64,
    publisher: watch::Sender<SearchFilters>,
}

impl SearchStore {
    pub fn new() -> Self {
        let (publisher, _) = watch::channel(SearchFilters::default());
        Self {
            filters: SearchFilters::default(),
            pending_history: HistoryMode::Replace,
            hydrated: false,
            synced_query: None,
            revision: 0,
            publisher,
        }
    }

    /// Tear the store down. Subscribers see their channel close.
    pub fn dispose(self) -> SearchFilters {
        debug!("Disposing search store at revision {}", self.revision);
        self.filters
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchFilters> {
        self.publisher.subscribe()
    }

    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    /// History mode requested for the next URL write
    pub fn pending_history(&self) -> HistoryMode {
        self.pending_history
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Bumped on every change of the filters value
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Last query acknowledged through [`SearchStore::mark_url_synced`]
    pub fn synced_query(&self) -> Option<&str> {
        self.synced_query.as_deref()
    }

    /// Initial population from the address bar. Leaves the pending history
    /// mode alone so hydration never causes a competing write.
    pub fn hydrate_from_url(&mut self, url: &str) {
        self.set_filters(codec::decode(url));
        self.hydrated = true;
    }

    /// Same decode as hydration, used when the user moved through history.
    pub fn apply_url_state(&mut self, url: &str) {
        self.set_filters(codec::decode(url));
        self.hydrated = true;
        self.pending_history = HistoryMode::Replace;
    }

    pub fn update_keyword(&mut self, keyword: &str) -> bool {
        self.update_query(HistoryMode::Push, |filters| {
            filters.keyword = keyword.to_string();
        })
    }

    /// Switching prefecture forgets the city, which belonged to the old one.
    pub fn update_prefecture(&mut self, prefecture: Option<&str>) -> bool {
        let current = self.filters.prefecture.clone();
        self.update_query(HistoryMode::Push, |filters| {
            filters.prefecture = prefecture.map(str::to_string);
            if filters.normalized().prefecture != current {
                filters.city = None;
            }
        })
    }

    pub fn update_city(&mut self, city: Option<&str>) -> bool {
        self.update_query(HistoryMode::Push, |filters| {
            filters.city = city.map(str::to_string);
        })
    }

    pub fn update_categories<I, S>(&mut self, categories: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let categories: Vec<String> = categories
            .into_iter()
            .map(|category| category.as_ref().to_string())
            .collect();
        self.update_query(HistoryMode::Push, |filters| {
            filters.categories = categories;
        })
    }

    /// Add the category if absent, remove it if present
    pub fn toggle_category(&mut self, category: &str) -> bool {
        let slug = category.trim().to_lowercase();
        if slug.is_empty() {
            return false;
        }
        self.update_query(HistoryMode::Push, |filters| {
            if let Some(index) = filters.categories.iter().position(|c| *c == slug) {
                filters.categories.remove(index);
            } else {
                filters.categories.push(slug);
            }
        })
    }

    pub fn update_sort(&mut self, sort: SortOrder) -> bool {
        self.update_query(HistoryMode::Push, |filters| {
            filters.sort = sort;
        })
    }

    pub fn set_limit(&mut self, limit: i64) -> bool {
        self.update_query(HistoryMode::Push, |filters| {
            filters.limit = clamp_limit(limit);
        })
    }

    /// Invalid coordinates clear the location rather than keeping a stale one.
    pub fn set_location(&mut self, lat: f64, lng: f64, radius_km: Option<f64>) -> bool {
        self.update_query(HistoryMode::Push, |filters| {
            filters.location = GeoFilter::new(lat, lng, radius_km);
        })
    }

    pub fn clear_location(&mut self) -> bool {
        self.update_query(HistoryMode::Push, |filters| {
            filters.location = None;
        })
    }

    /// Numbered pagination; leaves cursor mode.
    pub fn set_page(&mut self, page: i64) -> bool {
        let mut next = self.filters.clone();
        next.page = clamp_page(page);
        next.page_token = None;
        self.commit(next, HistoryMode::Replace)
    }

    pub fn next_page(&mut self) -> bool {
        let page = i64::from(self.filters.page) + 1;
        self.set_page(page)
    }

    /// Cursor pagination ("load more"); leaves numbered mode.
    pub fn set_page_token(&mut self, token: Option<&str>) -> bool {
        let mut next = self.filters.clone();
        next.page = 1;
        next.page_token = token.map(str::to_string);
        self.commit(next, HistoryMode::Replace)
    }

    /// Explicit submit of a new search: always a fresh history entry on page 1.
    pub fn submit_search(&mut self, keyword: &str) -> bool {
        self.update_query(HistoryMode::Push, |filters| {
            filters.keyword = keyword.to_string();
        })
    }

    pub fn clear_filters(&mut self) -> bool {
        self.commit(SearchFilters::default(), HistoryMode::Push)
    }

    /// The address bar now shows `query`.
    pub fn mark_url_synced(&mut self, query: &str) {
        let query = query.strip_prefix('?').unwrap_or(query);
        self.synced_query = Some(query.to_string());
        self.pending_history = HistoryMode::Replace;
    }

    /// True when the filters differ from what was last written to the URL
    pub fn needs_url_write(&self) -> bool {
        self.hydrated && self.synced_query.as_deref() != Some(codec::encode(&self.filters).as_str())
    }

    /// Change to the query itself: restart at the first page.
    fn update_query<F>(&mut self, mode: HistoryMode, change: F) -> bool
    where
        F: FnOnce(&mut SearchFilters),
    {
        let mut next = self.filters.clone();
        change(&mut next);
        next.page = 1;
        next.page_token = None;
        self.commit(next, mode)
    }

    /// Apply a change. Until the URL is synced, a pending push is never
    /// weakened to a replace, so several actions in one dispatch still get
    /// their own history entry. A no-op leaves the pending mode alone.
    fn commit(&mut self, next: SearchFilters, mode: HistoryMode) -> bool {
        let previous = self.pending_history;
        self.pending_history = match (previous, mode) {
            (HistoryMode::Push, _) | (_, HistoryMode::Push) => HistoryMode::Push,
            _ => HistoryMode::Replace,
        };
        if self.set_filters(next) {
            true
        } else {
            self.pending_history = previous;
            false
        }
    }

    fn set_filters(&mut self, next: SearchFilters) -> bool {
        let next = next.normalized();
        if next == self.filters {
            return false;
        }
        self.filters = next;
        self.revision += 1;
        self.publisher.send_replace(self.filters.clone());
        debug!(
            "Search store revision {} ({:?})",
            self.revision, self.pending_history
        );
        true
    }
}

impl Default for SearchStore {
    fn default() -> Self {
        Self::new()
    }
}
