use gym_finder::api::{HttpSearchBackend, SearchFetcher};
use gym_finder::config::ApiConfig;
use gym_finder::search::{page_range, total_pages, MemoryHistory, PageLink, SearchStore, UrlSync};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const PAGE_SIBLINGS: u32 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "gym_finder=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let as_json = args.iter().any(|arg| arg == "--json");
    let start_url = args
        .iter()
        .find(|arg| !arg.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| "/gyms".to_string());
    let config = ApiConfig::from_env();
    info!("Gym Finder against {}", config.base_url);

    let mut sync = UrlSync::new(SearchStore::new(), MemoryHistory::new(&start_url));
    sync.mount();
    info!("Filters: {:?}", sync.store().filters());

    let backend = Arc::new(HttpSearchBackend::with_config(config)?);
    let fetcher = SearchFetcher::spawn(backend, sync.store().subscribe());
    let state = fetcher.settled().await;

    if let Some(error) = &state.error {
        anyhow::bail!("Search failed: {}", error);
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&state.items)?);
        fetcher.shutdown().await;
        return Ok(());
    }

    for (i, gym) in state.items.iter().enumerate() {
        println!("{}. {} ({})", i + 1, gym.name, gym.slug);
        let place = [gym.prefecture.as_deref(), gym.city.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" / ");
        if !place.is_empty() {
            println!("   Area: {}", place);
        }
        if let Some(address) = &gym.address {
            println!("   Address: {}", address);
        }
        if !gym.equipments.is_empty() {
            println!("   Equipment: {}", gym.equipments.join(", "));
        }
        println!();
    }

    let filters = sync.store().filters();
    if let Some(meta) = &state.meta {
        info!("{} gyms in total", meta.total);
        if filters.page_token.is_none() {
            let pages = total_pages(meta.total, filters.limit);
            let pager = page_range(filters.page, pages, PAGE_SIBLINGS)
                .iter()
                .map(|link| match link {
                    PageLink::Page(n) if *n == filters.page => format!("[{}]", n),
                    PageLink::Page(n) => n.to_string(),
                    PageLink::Ellipsis => "…".to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ");
            println!("Pages: {}", pager);
        } else if meta.has_next {
            println!("More results available");
        }
    }

    fetcher.shutdown().await;
    Ok(())
}
