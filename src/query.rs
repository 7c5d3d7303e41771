// Pure, synchronous query pipeline over a hydrated catalog snapshot.
//
// Stage order is fixed: text search, predicate filters, sort, pagination.
// No I/O; given equal (catalog, state) inputs the output page is equal.

use crate::types::{Catalog, CatalogEntry, ListingStatus};
use ethers::types::U256;
use log::debug;
use std::cmp::Ordering;

/// Page sizes the caller may choose from.
pub const ALLOWED_PAGE_SIZES: &[usize] = &[4, 8, 12, 24, 48];
pub const DEFAULT_PAGE_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Listed,
    Auction,
    Sold,
}

impl StatusFilter {
    fn matches(&self, status: ListingStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Listed => status == ListingStatus::Listed,
            StatusFilter::Auction => status == ListingStatus::Auction,
            // No "sold" bit exists on-chain; an unlisted token inside a
            // marketplace-derived catalog has been sold or withdrawn.
            StatusFilter::Sold => status == ListingStatus::NotListed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    TokenIdAsc,
    TokenIdDesc,
    PriceAsc,
    PriceDesc,
}

impl SortKey {
    /// Canonical-integer comparison throughout; monetary values are never
    /// compared as floats. Ties break by token id so ordering is total.
    fn compare(&self, a: &CatalogEntry, b: &CatalogEntry) -> Ordering {
        let by_id = a.token_id.cmp(&b.token_id);
        match self {
            SortKey::TokenIdAsc => by_id,
            SortKey::TokenIdDesc => by_id.reverse(),
            SortKey::PriceAsc => a
                .info
                .active_price()
                .cmp(&b.info.active_price())
                .then(by_id),
            SortKey::PriceDesc => b
                .info
                .active_price()
                .cmp(&a.info.active_price())
                .then(by_id),
        }
    }
}

/// Inclusive price bounds over the entry's active price field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Option<U256>,
    pub max: Option<U256>,
}

impl PriceRange {
    fn contains(&self, price: U256) -> bool {
        if let Some(min) = self.min {
            if price < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if price > max {
                return false;
            }
        }
        true
    }
}

/// Caller-held, ephemeral query state. Any change to search text, filters,
/// sort key, or page size resets the current page to 1 — a stale page would
/// show entries inconsistent with the new predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    search: String,
    status: StatusFilter,
    price: PriceRange,
    sort: SortKey,
    page_size: usize,
    page: usize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: StatusFilter::All,
            price: PriceRange::default(),
            sort: SortKey::TokenIdAsc,
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if search != self.search {
            self.search = search;
            self.page = 1;
        }
    }

    pub fn set_status(&mut self, status: StatusFilter) {
        if status != self.status {
            self.status = status;
            self.page = 1;
        }
    }

    pub fn set_price_range(&mut self, price: PriceRange) {
        if price != self.price {
            self.price = price;
            self.page = 1;
        }
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        if sort != self.sort {
            self.sort = sort;
            self.page = 1;
        }
    }

    /// Applies only when `size` is one of [`ALLOWED_PAGE_SIZES`].
    pub fn set_page_size(&mut self, size: usize) {
        if !ALLOWED_PAGE_SIZES.contains(&size) {
            debug!("ignoring disallowed page size {}", size);
            return;
        }
        if size != self.page_size {
            self.page_size = size;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }
}

/// One ordered page of query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Pure function of `(catalog, state)`. Recomputation is only ever driven by
/// a change to either input.
pub fn run_query(catalog: &Catalog, state: &QueryState) -> Page<CatalogEntry> {
    let needle = state.search.trim().to_lowercase();

    let mut hits: Vec<&CatalogEntry> = catalog
        .entries()
        .filter(|e| needle.is_empty() || e.matches_text(&needle))
        .filter(|e| state.status.matches(e.info.status()))
        .filter(|e| state.price.contains(e.info.active_price()))
        .collect();

    hits.sort_by(|a, b| state.sort.compare(a, b));

    let total_items = hits.len();
    let total_pages = (total_items + state.page_size - 1) / state.page_size;
    let start = state.page.saturating_sub(1).saturating_mul(state.page_size);
    let items = hits
        .into_iter()
        .skip(start)
        .take(state.page_size)
        .cloned()
        .collect();

    Page {
        items,
        page: state.page,
        page_size: state.page_size,
        total_items,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CatalogEntry, SyncScope, TokenInfo, TokenMetadata};
    use ethers::types::Address;

    fn entry(id: u64, listed: bool, auctioned: bool, price: u64, bid: u64) -> CatalogEntry {
        CatalogEntry {
            token_id: U256::from(id),
            info: TokenInfo {
                owner: Address::zero(),
                is_listed: listed,
                is_auctioned: auctioned,
                price: U256::from(price),
                highest_bid: U256::from(bid),
                auction_end_time: U256::zero(),
            },
            metadata: None,
        }
    }

    fn named_entry(id: u64, name: &str) -> CatalogEntry {
        let mut e = entry(id, true, false, 1, 0);
        e.metadata = Some(TokenMetadata {
            name: Some(name.to_string()),
            ..Default::default()
        });
        e
    }

    fn catalog_of(entries: Vec<CatalogEntry>) -> Catalog {
        let mut catalog = Catalog::new(SyncScope::ActiveMarket);
        for e in entries {
            catalog.insert(e);
        }
        catalog
    }

    #[test]
    fn query_is_idempotent() {
        let catalog = catalog_of((0..7).map(|i| entry(i, true, false, 100 - i, 0)).collect());
        let mut state = QueryState::new();
        state.set_sort(SortKey::PriceAsc);
        state.set_page_size(4);
        let first = run_query(&catalog, &state);
        let second = run_query(&catalog, &state);
        assert_eq!(first, second);
    }

    #[test]
    fn pagination_boundaries() {
        let catalog = catalog_of((1..=10).map(|i| entry(i, true, false, i, 0)).collect());
        let mut state = QueryState::new();
        state.set_page_size(4);

        state.set_page(1);
        let p1 = run_query(&catalog, &state);
        assert_eq!(p1.items.len(), 4);
        assert_eq!(p1.total_items, 10);
        assert_eq!(p1.total_pages, 3);

        state.set_page(3);
        assert_eq!(run_query(&catalog, &state).items.len(), 2);

        state.set_page(4);
        assert!(run_query(&catalog, &state).items.is_empty());
    }

    #[test]
    fn search_change_resets_page() {
        let mut state = QueryState::new();
        state.set_page(3);
        assert_eq!(state.page(), 3);
        state.set_search("dragon");
        assert_eq!(state.page(), 1);
        // Setting the identical text again is not a change.
        state.set_page(2);
        state.set_search("dragon");
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn every_input_change_resets_page() {
        let mut state = QueryState::new();

        state.set_page(5);
        state.set_status(StatusFilter::Auction);
        assert_eq!(state.page(), 1);

        state.set_page(5);
        state.set_sort(SortKey::PriceDesc);
        assert_eq!(state.page(), 1);

        state.set_page(5);
        state.set_price_range(PriceRange {
            min: Some(U256::from(1u64)),
            max: None,
        });
        assert_eq!(state.page(), 1);

        state.set_page(5);
        state.set_page_size(8);
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn disallowed_page_size_is_ignored() {
        let mut state = QueryState::new();
        state.set_page(3);
        state.set_page_size(7);
        assert_eq!(state.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(state.page(), 3);
    }

    #[test]
    fn listed_filter_with_price_sort_excludes_bidless_auction() {
        // Catalog: token 10 listed at 1 ETH, token 11 in auction with no bids.
        let one_eth = 1_000_000_000_000_000_000u64;
        let catalog = catalog_of(vec![
            entry(10, true, false, one_eth, 0),
            entry(11, false, true, 0, 0),
        ]);
        let mut state = QueryState::new();
        state.set_status(StatusFilter::Listed);
        state.set_sort(SortKey::PriceAsc);
        let page = run_query(&catalog, &state);
        let ids: Vec<U256> = page.items.iter().map(|e| e.token_id).collect();
        assert_eq!(ids, vec![U256::from(10u64)]);
    }

    #[test]
    fn text_search_matches_name_and_fallback() {
        let catalog = catalog_of(vec![
            named_entry(1, "Cosmic Dragon"),
            named_entry(2, "Quiet Pond"),
            entry(42, true, false, 1, 0), // unnamed, display name #NFT42
        ]);
        let mut state = QueryState::new();

        state.set_search("DRAGON");
        assert_eq!(run_query(&catalog, &state).items.len(), 1);

        state.set_search("#nft42");
        let page = run_query(&catalog, &state);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].token_id, U256::from(42u64));
    }

    #[test]
    fn price_sort_uses_active_price_per_status() {
        // Auction entry's active price is the highest bid, not the ask.
        let mut auction = entry(1, false, true, 999, 5);
        auction.info.highest_bid = U256::from(5u64);
        let listed = entry(2, true, false, 10, 0);
        let catalog = catalog_of(vec![listed, auction]);

        let mut state = QueryState::new();
        state.set_sort(SortKey::PriceAsc);
        let page = run_query(&catalog, &state);
        let ids: Vec<U256> = page.items.iter().map(|e| e.token_id).collect();
        assert_eq!(ids, vec![U256::from(1u64), U256::from(2u64)]);
    }

    #[test]
    fn price_range_filters_active_price() {
        let catalog = catalog_of(vec![
            entry(1, true, false, 5, 0),
            entry(2, true, false, 50, 0),
            entry(3, true, false, 500, 0),
        ]);
        let mut state = QueryState::new();
        state.set_price_range(PriceRange {
            min: Some(U256::from(10u64)),
            max: Some(U256::from(100u64)),
        });
        let page = run_query(&catalog, &state);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].token_id, U256::from(2u64));
    }
}
