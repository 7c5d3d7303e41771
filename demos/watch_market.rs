//! # Real-time Market Watch Example
//!
//! Subscribes to marketplace mutation events and re-synchronizes the
//! catalog on (debounced) change. Run against a node with a WebSocket
//! endpoint configured in `rpc.ws_url`; without one the polling backstop
//! still drives refreshes.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example watch_market
//! ```

use anyhow::Result;
use nft_catalog_sdk::{
    event_watcher::ChangeCallback, CatalogEngine, EventWatcher, Hydrator, MarketReader,
    MetadataFetcher, MetadataSource, Settings, SyncScope,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let settings = Settings::new()?;
    let reader = Arc::new(MarketReader::from_settings(&settings)?);
    let fetcher: Arc<dyn MetadataSource> = Arc::new(MetadataFetcher::new(&settings.metadata)?);
    let hydrator = Hydrator::new(
        Arc::clone(&reader),
        fetcher,
        settings.hydration.chunk_size,
        Duration::from_millis(settings.hydration.inter_chunk_delay_ms),
    );
    let watcher = EventWatcher::from_settings(reader.context().clone(), &settings);
    let engine = Arc::new(CatalogEngine::new(hydrator).with_event_watcher(watcher));

    let catalog = engine.synchronize(SyncScope::ActiveMarket, false).await?;
    println!("Initial catalog: {} entries", catalog.len());

    let (tx, mut rx) = mpsc::unbounded_channel::<()>();
    let on_change: ChangeCallback = Arc::new(move || {
        let _ = tx.send(());
    });
    let subscription = engine.subscribe(on_change)?;

    println!("Watching for marketplace changes (Ctrl+C to stop)...");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(()) = rx.recv() => {
                match engine.synchronize(SyncScope::ActiveMarket, false).await {
                    Ok(catalog) => println!("Catalog refreshed: {} entries", catalog.len()),
                    Err(e) => {
                        // Last good snapshot stays in place.
                        eprintln!("refresh failed, keeping previous catalog: {}", e);
                    }
                }
            }
        }
    }

    subscription.unsubscribe();
    Ok(())
}
