//! Keeping the search filters and the address bar in step.

pub mod codec;
pub mod history;
pub mod pagination;
pub mod planner;
pub mod store;
pub mod sync;

pub use codec::{decode, encode};
pub use history::{Location, MemoryHistory, NavigationSink};
pub use pagination::{page_range, total_pages, PageLink};
pub use planner::{plan_navigation, HistoryMode, NavigationPlan};
pub use store::SearchStore;
pub use sync::{SyncPhase, SyncState, UrlSync};
