//! End-to-end query pipeline behavior over a realistic catalog snapshot:
//! combined search + filter + sort + pagination, and the interplay between
//! state changes and page resets.

use ethers::types::{Address, U256};
use nft_catalog_sdk::query::{PriceRange, ALLOWED_PAGE_SIZES};
use nft_catalog_sdk::{
    run_query, Catalog, CatalogEntry, QueryState, SortKey, StatusFilter, SyncScope, TokenInfo,
    TokenMetadata,
};

fn eth(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

fn entry(id: u64, name: &str, listed: bool, auctioned: bool, price: U256, bid: U256) -> CatalogEntry {
    CatalogEntry {
        token_id: U256::from(id),
        info: TokenInfo {
            owner: Address::zero(),
            is_listed: listed,
            is_auctioned: auctioned,
            price,
            highest_bid: bid,
            auction_end_time: if auctioned {
                U256::from(1_900_000_000u64)
            } else {
                U256::zero()
            },
        },
        metadata: Some(TokenMetadata {
            name: Some(name.to_string()),
            description: Some(format!("A fine specimen called {}", name)),
            ..Default::default()
        }),
    }
}

/// 12 entries: 6 listed, 4 in auction, 2 unlisted (sold).
fn market_catalog() -> Catalog {
    let mut catalog = Catalog::new(SyncScope::ActiveMarket);
    for (id, name, price) in [
        (1u64, "Amber Fox", 3u64),
        (2, "Basalt Crab", 1),
        (3, "Cinder Wolf", 7),
        (4, "Dune Serpent", 2),
        (5, "Ember Owl", 5),
        (6, "Frost Lynx", 4),
    ] {
        catalog.insert(entry(id, name, true, false, eth(price), U256::zero()));
    }
    for (id, name, bid) in [
        (7u64, "Gale Heron", 2u64),
        (8, "Holt Badger", 0),
        (9, "Iris Moth", 6),
        (10, "Jade Viper", 1),
    ] {
        catalog.insert(entry(id, name, false, true, U256::zero(), eth(bid)));
    }
    catalog.insert(entry(11, "Kelp Turtle", false, false, U256::zero(), U256::zero()));
    catalog.insert(entry(12, "Loam Boar", false, false, U256::zero(), U256::zero()));
    catalog
}

#[test]
fn full_pipeline_is_deterministic() {
    let catalog = market_catalog();
    let mut state = QueryState::new();
    state.set_status(StatusFilter::Listed);
    state.set_sort(SortKey::PriceAsc);
    state.set_page_size(4);

    let first = run_query(&catalog, &state);
    let second = run_query(&catalog, &state);
    assert_eq!(first, second);

    let ids: Vec<u64> = first.items.iter().map(|e| e.token_id.as_u64()).collect();
    // Cheapest listed first: 1 ETH, 2 ETH, 3 ETH, 4 ETH.
    assert_eq!(ids, vec![2, 4, 1, 6]);
    assert_eq!(first.total_items, 6);
    assert_eq!(first.total_pages, 2);
}

#[test]
fn auctions_sort_by_highest_bid() {
    let catalog = market_catalog();
    let mut state = QueryState::new();
    state.set_status(StatusFilter::Auction);
    state.set_sort(SortKey::PriceDesc);
    state.set_page_size(8);

    let page = run_query(&catalog, &state);
    let ids: Vec<u64> = page.items.iter().map(|e| e.token_id.as_u64()).collect();
    // Bids 6, 2, 1, 0 ETH; the bidless auction sorts last.
    assert_eq!(ids, vec![9, 7, 10, 8]);
}

#[test]
fn sold_filter_sees_unlisted_entries() {
    let catalog = market_catalog();
    let mut state = QueryState::new();
    state.set_status(StatusFilter::Sold);
    let page = run_query(&catalog, &state);
    assert_eq!(page.total_items, 2);
}

#[test]
fn search_narrows_then_page_reset_applies() {
    let catalog = market_catalog();
    let mut state = QueryState::new();
    state.set_page_size(4);
    state.set_page(3);

    // While on page 3, the user types a search; the next query must run
    // against page 1 of the narrowed result set.
    state.set_search("viper");
    assert_eq!(state.page(), 1);
    let page = run_query(&catalog, &state);
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].token_id, U256::from(10u64));
}

#[test]
fn search_matches_descriptions_too() {
    let catalog = market_catalog();
    let mut state = QueryState::new();
    state.set_search("fine specimen called amber");
    let page = run_query(&catalog, &state);
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].token_id, U256::from(1u64));
}

#[test]
fn price_range_combines_with_status() {
    let catalog = market_catalog();
    let mut state = QueryState::new();
    state.set_status(StatusFilter::Listed);
    state.set_price_range(PriceRange {
        min: Some(eth(3)),
        max: Some(eth(5)),
    });
    state.set_sort(SortKey::PriceAsc);

    let page = run_query(&catalog, &state);
    let ids: Vec<u64> = page.items.iter().map(|e| e.token_id.as_u64()).collect();
    // 3, 4, 5 ETH listings.
    assert_eq!(ids, vec![1, 6, 5]);
}

#[test]
fn pagination_walks_the_whole_result_set() {
    let catalog = market_catalog();
    let mut state = QueryState::new();
    state.set_page_size(4);

    let mut seen = Vec::new();
    for page_no in 1..=3 {
        state.set_page(page_no);
        let page = run_query(&catalog, &state);
        seen.extend(page.items.iter().map(|e| e.token_id));
    }
    assert_eq!(seen.len(), 12);

    state.set_page(4);
    assert!(run_query(&catalog, &state).items.is_empty());
}

#[test]
fn all_allowed_page_sizes_partition_consistently() {
    let catalog = market_catalog();
    for &size in ALLOWED_PAGE_SIZES {
        let mut state = QueryState::new();
        state.set_page_size(size);
        let first = run_query(&catalog, &state);
        assert_eq!(first.page_size, size);
        let expected_pages = (12 + size - 1) / size;
        assert_eq!(first.total_pages, expected_pages);
    }
}
