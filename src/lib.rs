//! # NFT Catalog SDK
//!
//! A Rust library for synchronizing a tradable NFT catalog from an on-chain
//! marketplace ledger and content-addressed metadata storage, and serving
//! search/filter/sort/pagination over it without re-touching the network on
//! every interaction.
//!
//! ## Overview
//!
//! The ledger and the content store are both external, slow, rate-limited,
//! and not transactionally consistent with each other. The SDK reconciles
//! them into a queryable in-memory catalog:
//!
//! - **Normalization**: heterogeneous raw value encodings become one
//!   canonical arbitrary-precision integer, fail-safe to zero
//! - **Resolution**: content identifiers resolve through a process-wide
//!   rate-limited request queue with gateway URL derivation and caching
//! - **Hydration**: token ids become full catalog entries via bounded
//!   concurrency and inter-batch pacing, tolerating per-item failure
//! - **Refresh**: ledger mutation events and a polling backstop trigger
//!   debounced re-synchronization
//! - **Querying**: a pure, synchronous pipeline derives the requested view
//!   from the cached snapshot
//!
//! ## Architecture
//!
//! ### Read Layer
//! [`chain_reader`] exposes the ledger's read surface with cached-connection
//! and forced-fresh paths; [`contracts`] holds the read-only ABIs.
//!
//! ### Resolution Layer
//! [`content_id`] normalizes identifier forms; [`metadata_fetcher`] fetches
//! documents through the shared dispatch queue; [`cache`] bounds the
//! document cache.
//!
//! ### Catalog & Query Layer
//! [`hydrator`] assembles entries, [`engine`] owns the snapshot lifecycle,
//! [`query`] serves deterministic paginated views, [`event_watcher`] keeps
//! the snapshot reasonably fresh.

// Core Types
/// Catalog data model (entries, scopes, listing state)
pub mod types;
/// Error taxonomy
pub mod error;

// Value Handling
/// Canonical value normalization
pub mod normalization;

// Resolution Layer
/// Content identifier extraction and gateway URLs
pub mod content_id;
/// Rate-limited metadata fetching
pub mod metadata_fetcher;
/// Metadata document caching
pub mod cache;

// Read Layer
/// Ledger read access (cached + forced-fresh paths)
pub mod chain_reader;
/// Smart contract ABIs (read-only)
pub mod contracts;

// Catalog & Query Layer
/// Batch hydration of token ids into entries
pub mod hydrator;
/// Engine facade and snapshot lifecycle
pub mod engine;
/// Pure query pipeline (search, filter, sort, paginate)
pub mod query;
/// Event-driven + polling refresh with debouncing
pub mod event_watcher;

// Infrastructure
/// Bounded polling primitive
pub mod poll;
/// Metrics and observability
pub mod metrics;
/// Configuration management
pub mod settings;
/// General utilities
pub mod utils;

// Re-exports for convenience
pub use chain_reader::{ChainContext, LedgerReader, MarketReader};
pub use engine::CatalogEngine;
pub use error::{EngineError, MetadataFetchError};
pub use event_watcher::{EventWatcher, Subscription};
pub use hydrator::Hydrator;
pub use metadata_fetcher::{MetadataFetcher, MetadataSource};
pub use query::{run_query, Page, QueryState, SortKey, StatusFilter};
pub use settings::Settings;
pub use types::{Catalog, CatalogEntry, ListingStatus, SyncScope, TokenInfo, TokenMetadata};
