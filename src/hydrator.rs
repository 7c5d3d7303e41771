// Batch hydration of token identifiers into catalog entries.
//
// Chunks are processed strictly sequentially with a fixed pause between
// them; within a chunk, each token's ledger info and metadata are fetched
// concurrently. A failed token is dropped from its chunk without aborting
// the chunk or the cycle.

use crate::chain_reader::LedgerReader;
use crate::error::{EngineError, MetadataFetchError};
use crate::metadata_fetcher::MetadataSource;
use crate::metrics;
use crate::types::{CatalogEntry, SyncScope, TokenMetadata};
use crate::utils::dedup_ids;
use ethers::types::U256;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

pub struct Hydrator<R: LedgerReader> {
    reader: Arc<R>,
    metadata: Arc<dyn MetadataSource>,
    chunk_size: usize,
    inter_chunk_delay: Duration,
}

impl<R: LedgerReader> Hydrator<R> {
    pub fn new(
        reader: Arc<R>,
        metadata: Arc<dyn MetadataSource>,
        chunk_size: usize,
        inter_chunk_delay: Duration,
    ) -> Self {
        Self {
            reader,
            metadata,
            chunk_size: chunk_size.max(1),
            inter_chunk_delay,
        }
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    /// Builds the deduplicated id set for a scope. A token reported by more
    /// than one underlying query appears exactly once.
    pub async fn enumerate(
        &self,
        scope: SyncScope,
        refresh: bool,
    ) -> Result<Vec<U256>, EngineError> {
        match scope {
            SyncScope::ActiveMarket => {
                let (listings, auctions) = tokio::try_join!(
                    self.reader.list_active_listings(refresh),
                    self.reader.list_active_auctions(refresh)
                )?;
                Ok(dedup_ids(listings.into_iter().chain(auctions)))
            }
            SyncScope::CreatedBy(creator) => {
                Ok(dedup_ids(self.reader.list_created_by(creator, refresh).await?))
            }
            SyncScope::PurchasedBy(buyer) => {
                Ok(dedup_ids(self.reader.list_purchased_by(buyer, refresh).await?))
            }
        }
    }

    /// Hydrates the given ids. Chunk order is preserved in the result;
    /// order within a chunk is not guaranteed. Failed tokens are logged and
    /// dropped; the cycle always runs to the last chunk.
    pub async fn hydrate(&self, ids: &[U256], refresh: bool) -> Vec<CatalogEntry> {
        let mut out = Vec::with_capacity(ids.len());
        let total_chunks = (ids.len() + self.chunk_size - 1) / self.chunk_size;
        for (index, chunk) in ids.chunks(self.chunk_size).enumerate() {
            let results =
                futures::future::join_all(chunk.iter().map(|id| self.hydrate_one(*id, refresh)))
                    .await;
            let survived: Vec<CatalogEntry> = results.into_iter().flatten().collect();
            debug!(
                "[Hydrator] chunk {}/{}: {}/{} entries hydrated",
                index + 1,
                total_chunks,
                survived.len(),
                chunk.len()
            );
            out.extend(survived);
            // Pace between chunks, not between items; the upstream rate
            // limiter rejects bursts, not volume.
            if index + 1 < total_chunks && !self.inter_chunk_delay.is_zero() {
                sleep(self.inter_chunk_delay).await;
            }
        }
        out
    }

    async fn hydrate_one(&self, token_id: U256, refresh: bool) -> Option<CatalogEntry> {
        let (info_res, meta_res) = tokio::join!(
            self.reader.get_info(token_id, refresh),
            self.fetch_metadata(token_id)
        );
        let info = match info_res {
            Ok(info) => info,
            Err(e) => {
                warn!("[Hydrator] dropping token {}: {}", token_id, e);
                metrics::increment_hydration_dropped();
                return None;
            }
        };
        let metadata = match meta_res {
            Ok(doc) => Some(doc),
            Err(e) => {
                // Entry keeps its ledger info; metadata stays unavailable,
                // never fabricated.
                warn!("[Hydrator] token {} metadata unavailable: {}", token_id, e);
                metrics::increment_metadata_failure();
                None
            }
        };
        Some(CatalogEntry {
            token_id,
            info,
            metadata,
        })
    }

    async fn fetch_metadata(&self, token_id: U256) -> Result<TokenMetadata, MetadataFetchError> {
        let uri = self
            .reader
            .token_uri(token_id)
            .await
            .map_err(|e| MetadataFetchError::transient(token_id.to_string(), e))?;
        self.metadata.fetch_document(&uri).await
    }
}
