// Core catalog data model: hydrated entries, per-scope catalogs, listing state.

use chrono::{DateTime, Utc};
use ethers::types::{Address, U256};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalization;

/// Opaque, stringifiable token identifier. Unique and stable for the
/// lifetime of the token.
pub type TokenId = U256;

/// Off-chain metadata document for a token.
///
/// The upstream document is arbitrary JSON; the well-known fields are lifted
/// out and everything else is preserved in `extra`. Partially malformed
/// documents still deserialize (unknown shapes land in `extra`, missing
/// fields default to `None`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Raw image reference as stored in the document (often `ipfs://...`).
    #[serde(default)]
    pub image: Option<String>,
    /// Gateway-resolved variant of `image`, annotated by the resolver after
    /// a successful fetch. Never present in the upstream document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_gateway_url: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Mutually exclusive listing state as seen by the ledger. The cached copy
/// may lag the chain; exactly one variant holds per snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingStatus {
    NotListed,
    Listed,
    Auction,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::NotListed => "not_listed",
            ListingStatus::Listed => "listed",
            ListingStatus::Auction => "auction",
        }
    }
}

/// On-chain state snapshot for one token.
///
/// `price` and `highest_bid` are always canonical integers after hydration;
/// absence on-chain normalizes to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub owner: Address,
    pub is_listed: bool,
    pub is_auctioned: bool,
    pub price: U256,
    pub highest_bid: U256,
    /// Seconds since epoch; zero when no auction is running.
    pub auction_end_time: U256,
}

impl TokenInfo {
    pub fn status(&self) -> ListingStatus {
        if self.is_auctioned {
            ListingStatus::Auction
        } else if self.is_listed {
            ListingStatus::Listed
        } else {
            ListingStatus::NotListed
        }
    }

    /// The price field that is semantically active for the current status:
    /// the highest bid while in auction, the ask price otherwise.
    pub fn active_price(&self) -> U256 {
        match self.status() {
            ListingStatus::Auction => self.highest_bid,
            _ => self.price,
        }
    }

    pub fn auction_ends_at(&self) -> Option<DateTime<Utc>> {
        if self.auction_end_time.is_zero() {
            return None;
        }
        normalization::seconds_to_datetime(self.auction_end_time)
    }
}

/// Fully hydrated catalog entry: ledger info plus (optionally) the resolved
/// metadata document. `metadata` is owned exclusively by the entry and is
/// replaced wholesale on re-fetch, never patched in place.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub token_id: TokenId,
    pub info: TokenInfo,
    /// `None` means "metadata unavailable", not absence of the token.
    pub metadata: Option<TokenMetadata>,
}

impl CatalogEntry {
    /// Display name derived from metadata, falling back to `#NFT<tokenId>`
    /// when no name-like field is present.
    pub fn display_name(&self) -> String {
        self.metadata
            .as_ref()
            .and_then(|m| m.name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("#NFT{}", self.token_id))
    }

    pub fn description(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.description.as_deref())
            .unwrap_or("")
    }

    /// Case-insensitive substring match against display name and description.
    /// `needle` must already be lowercased.
    pub fn matches_text(&self, needle: &str) -> bool {
        self.display_name().to_lowercase().contains(needle)
            || self.description().to_lowercase().contains(needle)
    }
}

/// Query context a catalog is scoped to. Membership is refreshed wholesale
/// per synchronization cycle, never incrementally patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncScope {
    /// Union of active fixed-price listings and running auctions.
    ActiveMarket,
    /// Tokens minted by the given account.
    CreatedBy(Address),
    /// Tokens the given account has bought.
    PurchasedBy(Address),
}

impl SyncScope {
    pub fn label(&self) -> String {
        match self {
            SyncScope::ActiveMarket => "active market".to_string(),
            SyncScope::CreatedBy(addr) => format!("creations of {}", crate::utils::short_addr(addr)),
            SyncScope::PurchasedBy(addr) => format!("purchases of {}", crate::utils::short_addr(addr)),
        }
    }
}

/// In-memory, per-scope collection of hydrated entries. Iteration order is
/// insertion order (hydration order), which keeps repeated queries over the
/// same snapshot deterministic.
#[derive(Debug, Clone)]
pub struct Catalog {
    scope: SyncScope,
    entries: IndexMap<TokenId, CatalogEntry>,
}

impl Catalog {
    pub fn new(scope: SyncScope) -> Self {
        Self {
            scope,
            entries: IndexMap::new(),
        }
    }

    pub fn scope(&self) -> SyncScope {
        self.scope
    }

    pub fn insert(&mut self, entry: CatalogEntry) {
        self.entries.insert(entry.token_id, entry);
    }

    pub fn get(&self, token_id: &TokenId) -> Option<&CatalogEntry> {
        self.entries.get(token_id)
    }

    pub fn contains(&self, token_id: &TokenId) -> bool {
        self.entries.contains_key(token_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn token_ids(&self) -> impl Iterator<Item = &TokenId> {
        self.entries.keys()
    }
}
