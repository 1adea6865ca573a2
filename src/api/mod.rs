pub mod client;
pub mod fetcher;
pub mod traits;
pub mod types;

pub use client::HttpSearchBackend;
pub use fetcher::{FetchState, SearchFetcher};
pub use traits::SearchBackend;
pub use types::{SearchRequest, SearchResponse};
