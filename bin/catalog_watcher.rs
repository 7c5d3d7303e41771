//! # Catalog Watcher Service
//!
//! Long-running service that keeps a marketplace catalog synchronized and
//! prints the current view whenever the ledger changes.
//!
//! ## Overview
//!
//! This service:
//! - Performs an initial synchronization for the chosen scope
//! - Subscribes to marketplace mutation events (debounced) plus the polling
//!   backstop and re-synchronizes on change
//! - Handles graceful shutdown on Ctrl+C
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin catalog_watcher -- --scope market
//! cargo run --bin catalog_watcher -- --scope created --address 0x...
//! ```
//!
//! Press Ctrl+C to stop gracefully.

use anyhow::{anyhow, Result};
use clap::Parser;
use colored::Colorize;
use ethers::prelude::Middleware;
use ethers::types::Address;
use nft_catalog_sdk::{
    event_watcher::ChangeCallback,
    metrics,
    normalization::format_eth,
    poll::poll_until,
    query::run_query,
    settings::{LogFormat, Settings},
    Catalog, CatalogEngine, EventWatcher, Hydrator, LedgerReader, MarketReader, MetadataFetcher,
    MetadataSource, QueryState, SyncScope,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(
    name = "catalog_watcher",
    about = "Keeps an NFT marketplace catalog synchronized and prints it on change"
)]
struct Args {
    /// Catalog scope: market, created, purchased
    #[arg(long, default_value = "market")]
    scope: String,

    /// Account address (required for the created/purchased scopes)
    #[arg(long)]
    address: Option<String>,

    /// Run one synchronization cycle and exit
    #[arg(long)]
    once: bool,

    /// Force fresh-connection ledger reads for the initial cycle
    #[arg(long)]
    refresh: bool,
}

fn parse_scope(args: &Args) -> Result<(SyncScope, Option<Address>)> {
    let account = match &args.address {
        Some(raw) => Some(
            raw.parse::<Address>()
                .map_err(|e| anyhow!("invalid --address '{}': {}", raw, e))?,
        ),
        None => None,
    };
    let scope = match args.scope.as_str() {
        "market" => SyncScope::ActiveMarket,
        "created" => SyncScope::CreatedBy(
            account.ok_or_else(|| anyhow!("--scope created requires --address"))?,
        ),
        "purchased" => SyncScope::PurchasedBy(
            account.ok_or_else(|| anyhow!("--scope purchased requires --address"))?,
        ),
        other => return Err(anyhow!("unknown scope '{}'", other)),
    };
    Ok((scope, account))
}

fn init_logging(settings: &Settings) {
    match settings.log.format {
        LogFormat::Json => {
            #[cfg(feature = "observability")]
            {
                tracing_subscriber::fmt().json().init();
            }
            #[cfg(not(feature = "observability"))]
            {
                env_logger::Builder::from_env(
                    env_logger::Env::default().default_filter_or(settings.log.level.as_str()),
                )
                .init();
                log::warn!("json log format requires the 'observability' feature; using pretty");
            }
        }
        LogFormat::Pretty => {
            env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(settings.log.level.as_str()),
            )
            .init();
        }
    }
}

fn print_catalog(catalog: &Catalog) {
    let page = run_query(catalog, &QueryState::new());
    println!(
        "\n{} {} entries ({} shown)",
        "Catalog:".bold(),
        page.total_items,
        page.items.len()
    );
    for entry in &page.items {
        let status = match entry.info.status() {
            nft_catalog_sdk::ListingStatus::Listed => "listed".green(),
            nft_catalog_sdk::ListingStatus::Auction => "auction".yellow(),
            nft_catalog_sdk::ListingStatus::NotListed => "sold".dimmed(),
        };
        let mut line = format!(
            "  {:>8}  {:<32} {:<8} {}",
            entry.token_id,
            entry.display_name(),
            status,
            format_eth(entry.info.active_price())
        );
        if let Some(ends_at) = entry.info.auction_ends_at() {
            line.push_str(&format!("  ends {}", ends_at.format("%Y-%m-%d %H:%M UTC")));
        }
        println!("{}", line);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let settings = Settings::new()?;
    init_logging(&settings);
    metrics::describe_metrics();

    #[cfg(feature = "observability")]
    if settings.metrics.enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], settings.metrics.port))
            .install()?;
        println!("Prometheus exporter listening on :{}", settings.metrics.port);
    }

    let (scope, account) = parse_scope(&args)?;

    println!("{}", "Initializing NFT Catalog SDK...".cyan());
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

    // Wait for the ledger endpoint before the first cycle.
    let probe = reader.cached_provider();
    let block = poll_until(10, Duration::from_millis(300), || {
        let provider = Arc::clone(&probe);
        async move { provider.get_block_number().await.ok() }
    })
    .await
    .map_err(|e| anyhow!("ledger endpoint unreachable: {}", e))?;
    println!("Connected at block {}", block);

    let catalog = engine.synchronize(scope, args.refresh).await?;
    print_catalog(&catalog);

    if let Some(account) = account {
        let balance = reader.get_withdrawable_balance(account).await?;
        println!(
            "{} {}",
            "Withdrawable balance:".bold(),
            format_eth(balance)
        );
    }

    if args.once {
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<()>();
    let on_change: ChangeCallback = Arc::new(move || {
        let _ = tx.send(());
    });
    let subscription = engine.subscribe(on_change)?;
    println!("{}", "Watching marketplace events (Ctrl+C to stop)...".cyan());

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                println!("{}", "Shutting down...".yellow());
                break;
            }
            Some(()) = rx.recv() => {
                match engine.synchronize(scope, false).await {
                    Ok(catalog) => print_catalog(&catalog),
                    // Previous snapshot is still what print_catalog would
                    // show; just flag the failed refresh.
                    Err(e) => eprintln!("{} {}", "refresh failed:".red(), e),
                }
            }
        }
    }

    subscription.unsubscribe();
    Ok(())
}
