use crate::search::codec;
use crate::search::planner::HistoryMode;

/// Address-bar location split into path and query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    /// Query string without the leading `?`
    pub search: String,
}

impl Location {
    pub fn parse(url: &str) -> Self {
        Self {
            pathname: codec::path_part(url).unwrap_or("/").to_string(),
            search: codec::query_part(url).to_string(),
        }
    }

    pub fn href(&self) -> String {
        if self.search.is_empty() {
            self.pathname.clone()
        } else {
            format!("{}?{}", self.pathname, self.search)
        }
    }
}

/// Session history the URL sync writes to.
///
/// In a browser this wraps `location` plus `pushState`/`replaceState`; any
/// other front end with a back/forward notion can provide its own.
pub trait NavigationSink {
    /// Current location, `None` outside a browsing context
    fn location(&self) -> Option<Location>;

    fn push(&mut self, url: &str);

    fn replace(&mut self, url: &str);
}

/// In-memory session history with back/forward
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    entries: Vec<Location>,
    index: usize,
    writes: Vec<(HistoryMode, String)>,
}

impl MemoryHistory {
    pub fn new(initial_url: &str) -> Self {
        Self {
            entries: vec![Location::parse(initial_url)],
            index: 0,
            writes: Vec::new(),
        }
    }

    /// History without a current location, as during server rendering
    pub fn detached() -> Self {
        Self::default()
    }

    /// Step back one entry, returning the new address
    pub fn back(&mut self) -> Option<String> {
        if self.index == 0 || self.entries.is_empty() {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].href())
    }

    /// Step forward one entry, returning the new address
    pub fn forward(&mut self) -> Option<String> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].href())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn entries(&self) -> &[Location] {
        &self.entries
    }

    /// Every push/replace received, in order
    pub fn writes(&self) -> &[(HistoryMode, String)] {
        &self.writes
    }
}

impl NavigationSink for MemoryHistory {
    fn location(&self) -> Option<Location> {
        self.entries.get(self.index).cloned()
    }

    fn push(&mut self, url: &str) {
        self.writes.push((HistoryMode::Push, url.to_string()));
        if !self.entries.is_empty() {
            // a new entry drops everything ahead of the current one
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(Location::parse(url));
        self.index = self.entries.len() - 1;
    }

    fn replace(&mut self, url: &str) {
        self.writes.push((HistoryMode::Replace, url.to_string()));
        match self.entries.get_mut(self.index) {
            Some(entry) => *entry = Location::parse(url),
            None => {
                self.entries.push(Location::parse(url));
                self.index = 0;
            }
        }
    }
}
