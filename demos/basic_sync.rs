//! # Basic SDK Setup Example
//!
//! Demonstrates how to initialize the NFT Catalog SDK, run one
//! synchronization cycle, and query the resulting catalog:
//! - Settings configuration
//! - Ledger reader and metadata fetcher setup
//! - Engine construction and synchronization
//! - Search/filter/sort/pagination over the snapshot
//!
//! ## Prerequisites
//!
//! - A `Config.toml` with `rpc.http_url` and the contract addresses
//!   (or the matching `NFT_SDK_*` environment variables)
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example basic_sync
//! ```

use anyhow::Result;
use nft_catalog_sdk::{
    normalization::format_eth, CatalogEngine, Hydrator, MarketReader, MetadataFetcher,
    MetadataSource, QueryState, Settings, SortKey, StatusFilter, SyncScope,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    println!("Initializing NFT Catalog SDK...");

    // 1. Load settings from config file or environment
    let settings = Settings::new()?;
    println!("Settings loaded");

    // 2. Ledger reader (cached + forced-fresh read paths)
    let reader = Arc::new(MarketReader::from_settings(&settings)?);

    // 3. Metadata fetcher over the shared rate-limited queue
    let fetcher: Arc<dyn MetadataSource> = Arc::new(MetadataFetcher::new(&settings.metadata)?);

    // 4. Engine
    let hydrator = Hydrator::new(
        Arc::clone(&reader),
        fetcher,
        settings.hydration.chunk_size,
        Duration::from_millis(settings.hydration.inter_chunk_delay_ms),
    );
    let engine = CatalogEngine::new(hydrator);

    // 5. One synchronization cycle over the active market
    let catalog = engine.synchronize(SyncScope::ActiveMarket, false).await?;
    println!("Synchronized {} catalog entries", catalog.len());

    // 6. Query: listed tokens, cheapest first, first page of 8
    let mut state = QueryState::new();
    state.set_status(StatusFilter::Listed);
    state.set_sort(SortKey::PriceAsc);
    state.set_page_size(8);

    let page = engine.query(&state);
    println!(
        "Listed tokens, cheapest first (page {}/{}):",
        page.page, page.total_pages
    );
    for entry in &page.items {
        println!(
            "  {:>6}  {:<30} {}",
            entry.token_id,
            entry.display_name(),
            format_eth(entry.info.active_price())
        );
    }

    // 7. Free-text search resets pagination automatically
    state.set_search("dragon");
    let hits = engine.query(&state);
    println!("Search 'dragon': {} matches", hits.total_items);

    Ok(())
}
