// Read-only ledger access.
//
// Two read paths: routine reads go through a long-lived cached connection;
// forced-fresh reads build a brand-new connection bound to latest state,
// probing it before use. Intermediate gateways can pin cached responses to a
// connection, so a fresh provider is the only way to bypass that layer.
// Freshness is best-effort: after the retry budget the reader falls back to
// the cached connection rather than failing the whole operation.

use crate::contracts::{IErc721Metadata, INftMarketplace};
use crate::error::EngineError;
use crate::normalization::{self, RawAmount};
use crate::settings::Settings;
use crate::types::TokenInfo;
use async_trait::async_trait;
use ethers::prelude::{Http, Middleware, Provider};
use ethers::types::{Address, U256};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Read-only connection context handed to the reader at construction.
///
/// Owned and refreshed by the caller; the engine never caches it beyond one
/// synchronization call.
#[derive(Debug, Clone)]
pub struct ChainContext {
    pub rpc_url: String,
    pub ws_url: Option<String>,
    pub marketplace: Address,
    pub collection: Address,
}

impl ChainContext {
    pub fn from_settings(settings: &Settings) -> Result<Self, EngineError> {
        if settings.rpc.http_url.trim().is_empty() {
            return Err(EngineError::terminal("rpc.http_url is not configured"));
        }
        let marketplace = settings
            .contracts
            .marketplace
            .parse::<Address>()
            .map_err(|e| {
                EngineError::terminal(format!(
                    "invalid marketplace address '{}': {}",
                    settings.contracts.marketplace, e
                ))
            })?;
        let collection = settings
            .contracts
            .collection
            .parse::<Address>()
            .map_err(|e| {
                EngineError::terminal(format!(
                    "invalid collection address '{}': {}",
                    settings.contracts.collection, e
                ))
            })?;
        Ok(Self {
            rpc_url: settings.rpc.http_url.clone(),
            ws_url: settings.rpc.ws_url.clone(),
            marketplace,
            collection,
        })
    }
}

/// Read surface of the marketplace ledger. The seam the batch loader (and
/// its tests) sit on.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn list_active_listings(&self, refresh: bool) -> Result<Vec<U256>, EngineError>;
    async fn list_active_auctions(&self, refresh: bool) -> Result<Vec<U256>, EngineError>;
    async fn get_info(&self, token_id: U256, refresh: bool) -> Result<TokenInfo, EngineError>;
    async fn list_created_by(&self, creator: Address, refresh: bool)
        -> Result<Vec<U256>, EngineError>;
    async fn list_purchased_by(&self, buyer: Address, refresh: bool)
        -> Result<Vec<U256>, EngineError>;
    async fn get_withdrawable_balance(&self, account: Address) -> Result<U256, EngineError>;
    async fn token_uri(&self, token_id: U256) -> Result<String, EngineError>;
}

/// Ledger reader over an ethers HTTP provider.
pub struct MarketReader {
    ctx: ChainContext,
    provider: Arc<Provider<Http>>,
    fresh_max_attempts: u32,
    fresh_base_delay: Duration,
}

impl MarketReader {
    pub fn new(
        ctx: ChainContext,
        fresh_max_attempts: u32,
        fresh_base_delay: Duration,
    ) -> Result<Self, EngineError> {
        let provider = Provider::<Http>::try_from(ctx.rpc_url.as_str())
            .map_err(|e| EngineError::terminal(format!("invalid rpc url '{}': {}", ctx.rpc_url, e)))?;
        Ok(Self {
            ctx,
            provider: Arc::new(provider),
            fresh_max_attempts: fresh_max_attempts.max(1),
            fresh_base_delay,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, EngineError> {
        let ctx = ChainContext::from_settings(settings)?;
        Self::new(
            ctx,
            settings.rpc.fresh_read_max_attempts,
            Duration::from_millis(settings.rpc.fresh_read_base_delay_ms),
        )
    }

    pub fn context(&self) -> &ChainContext {
        &self.ctx
    }

    /// Long-lived provider for routine polling reads.
    pub fn cached_provider(&self) -> Arc<Provider<Http>> {
        Arc::clone(&self.provider)
    }

    /// Provider selection for one read. `refresh` forces a new connection
    /// probed against latest state, with linearly increasing retry delays;
    /// exhaustion falls back to the cached connection.
    async fn provider_for(&self, refresh: bool) -> Arc<Provider<Http>> {
        if !refresh {
            return Arc::clone(&self.provider);
        }
        for attempt in 1..=self.fresh_max_attempts {
            match Provider::<Http>::try_from(self.ctx.rpc_url.as_str()) {
                Ok(fresh) => match fresh.get_block_number().await {
                    Ok(block) => {
                        debug!(
                            "[MarketReader] fresh connection ready at block {} (attempt {})",
                            block, attempt
                        );
                        return Arc::new(fresh);
                    }
                    Err(e) => {
                        warn!(
                            "[MarketReader] fresh connection probe failed (attempt {}/{}): {}",
                            attempt, self.fresh_max_attempts, e
                        );
                    }
                },
                Err(e) => {
                    warn!(
                        "[MarketReader] fresh provider construction failed (attempt {}/{}): {}",
                        attempt, self.fresh_max_attempts, e
                    );
                }
            }
            if attempt < self.fresh_max_attempts {
                sleep(self.fresh_base_delay * attempt).await;
            }
        }
        warn!(
            "[MarketReader] falling back to cached connection after {} fresh attempts",
            self.fresh_max_attempts
        );
        Arc::clone(&self.provider)
    }

    fn marketplace_at(&self, provider: Arc<Provider<Http>>) -> INftMarketplace<Provider<Http>> {
        INftMarketplace::new(self.ctx.marketplace, provider)
    }

    fn collection_at(&self, provider: Arc<Provider<Http>>) -> IErc721Metadata<Provider<Http>> {
        IErc721Metadata::new(self.ctx.collection, provider)
    }
}

#[async_trait]
impl LedgerReader for MarketReader {
    async fn list_active_listings(&self, refresh: bool) -> Result<Vec<U256>, EngineError> {
        let market = self.marketplace_at(self.provider_for(refresh).await);
        market
            .get_active_listings()
            .call()
            .await
            .map_err(EngineError::transient)
    }

    async fn list_active_auctions(&self, refresh: bool) -> Result<Vec<U256>, EngineError> {
        let market = self.marketplace_at(self.provider_for(refresh).await);
        market
            .get_active_auctions()
            .call()
            .await
            .map_err(EngineError::transient)
    }

    async fn get_info(&self, token_id: U256, refresh: bool) -> Result<TokenInfo, EngineError> {
        let market = self.marketplace_at(self.provider_for(refresh).await);
        let (owner, is_listed, is_auctioned, price, highest_bid, auction_end_time) = market
            .get_token_info(token_id)
            .call()
            .await
            .map_err(EngineError::transient)?;
        // Raw ledger values pass through the normalizer before entering an entry.
        Ok(TokenInfo {
            owner,
            is_listed,
            is_auctioned,
            price: normalization::normalize(RawAmount::Uint(price)),
            highest_bid: normalization::normalize(RawAmount::Uint(highest_bid)),
            auction_end_time: normalization::normalize(RawAmount::Uint(auction_end_time)),
        })
    }

    async fn list_created_by(
        &self,
        creator: Address,
        refresh: bool,
    ) -> Result<Vec<U256>, EngineError> {
        let market = self.marketplace_at(self.provider_for(refresh).await);
        market
            .get_created_tokens(creator)
            .call()
            .await
            .map_err(EngineError::transient)
    }

    async fn list_purchased_by(
        &self,
        buyer: Address,
        refresh: bool,
    ) -> Result<Vec<U256>, EngineError> {
        let market = self.marketplace_at(self.provider_for(refresh).await);
        market
            .get_purchased_tokens(buyer)
            .call()
            .await
            .map_err(EngineError::transient)
    }

    async fn get_withdrawable_balance(&self, account: Address) -> Result<U256, EngineError> {
        let market = self.marketplace_at(Arc::clone(&self.provider));
        let raw = market
            .get_withdrawable_balance(account)
            .call()
            .await
            .map_err(EngineError::transient)?;
        Ok(normalization::normalize(RawAmount::Uint(raw)))
    }

    async fn token_uri(&self, token_id: U256) -> Result<String, EngineError> {
        let collection = self.collection_at(Arc::clone(&self.provider));
        collection
            .token_uri(token_id)
            .call()
            .await
            .map_err(EngineError::transient)
    }
}
