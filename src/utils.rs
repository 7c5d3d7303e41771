// src/utils.rs
// Utility functions for the NFT Catalog SDK

use ethers::types::{Address, U256};
use indexmap::IndexSet;

/// Deduplicates token ids coming from overlapping enumeration sources
/// (a token can be reported by more than one ledger query). First
/// occurrence wins; relative order is preserved.
pub fn dedup_ids<I: IntoIterator<Item = U256>>(ids: I) -> Vec<U256> {
    ids.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}

/// Short display form of an address for log lines.
pub fn short_addr(addr: &Address) -> String {
    let s = format!("{:?}", addr);
    if s.len() <= 10 {
        return s;
    }
    format!("{}..{}", &s[..6], &s[s.len() - 4..])
}
