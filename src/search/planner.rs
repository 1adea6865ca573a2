use tracing::debug;

/// How a state change is written to session history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryMode {
    /// New entry, reachable with the back button
    Push,
    /// Overwrite the current entry in place
    #[default]
    Replace,
}

/// Outcome of [`plan_navigation`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationPlan {
    /// Target address, `None` when there is no browsing context yet
    pub url: Option<String>,
    pub mode: HistoryMode,
    pub should_navigate: bool,
}

/// Decide whether and how a new query string is reflected in history.
///
/// A push that would not change the query is downgraded to a replace, and a
/// replace with an identical query is skipped altogether.
pub fn plan_navigation(
    pathname: Option<&str>,
    current_search: &str,
    next_search: &str,
    requested: HistoryMode,
) -> NavigationPlan {
    let current = current_search.strip_prefix('?').unwrap_or(current_search);
    let next = next_search.strip_prefix('?').unwrap_or(next_search);
    let unchanged = current == next;

    let mode = if requested == HistoryMode::Push && unchanged {
        HistoryMode::Replace
    } else {
        requested
    };

    let Some(pathname) = pathname else {
        debug!("No pathname available, deferring navigation");
        return NavigationPlan {
            url: None,
            mode,
            should_navigate: false,
        };
    };

    let url = if next.is_empty() {
        pathname.to_string()
    } else {
        format!("{}?{}", pathname, next)
    };
    let should_navigate = !(mode == HistoryMode::Replace && unchanged);

    debug!(
        "Planned {:?} to {} (navigate: {})",
        mode, url, should_navigate
    );
    NavigationPlan {
        url: Some(url),
        mode,
        should_navigate,
    }
}
