// Rate-limited metadata resolution over the content gateway.
//
// The gateway enforces its rate limit per client, not per caller, so every
// fetch in the process funnels through one shared dispatch queue: a
// semaphore bounds in-flight requests and a governor limiter enforces the
// minimum spacing between dispatches.

use crate::cache::CacheManager;
use crate::content_id::{extract_content_path, gateway_url};
use crate::error::{EngineError, MetadataFetchError};
use crate::metrics;
use crate::settings::MetadataSettings;
use crate::types::TokenMetadata;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use once_cell::sync::OnceCell;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_retry::strategy::{jitter, FixedInterval};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const DEFAULT_MAX_IN_FLIGHT: usize = 4;
const DEFAULT_MIN_SPACING_MS: u64 = 200;

static FETCH_QUEUE: OnceCell<FetchQueue> = OnceCell::new();

/// Process-wide dispatch gate for the content gateway.
struct FetchQueue {
    semaphore: Arc<Semaphore>,
    limiter: Arc<DirectRateLimiter>,
}

impl FetchQueue {
    fn new(max_in_flight: usize, min_spacing: Duration) -> Self {
        let spacing = min_spacing.max(Duration::from_millis(1));
        let quota = Quota::with_period(spacing)
            .expect("dispatch spacing is non-zero")
            .allow_burst(NonZeroU32::new(1).expect("burst of one"));
        Self {
            semaphore: Arc::new(Semaphore::new(max_in_flight.max(1))),
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Waits for a concurrency slot, then for the dispatch spacing window.
    async fn admit(&self) -> anyhow::Result<OwnedSemaphorePermit> {
        let permit = self.semaphore.clone().acquire_owned().await?;
        self.limiter.until_ready().await;
        Ok(permit)
    }
}

fn global_queue() -> &'static FetchQueue {
    FETCH_QUEUE.get_or_init(|| {
        FetchQueue::new(
            DEFAULT_MAX_IN_FLIGHT,
            Duration::from_millis(DEFAULT_MIN_SPACING_MS),
        )
    })
}

/// Installs the queue limits from configuration. The first caller wins; the
/// queue is shared process-wide and cannot be re-shaped once traffic flows.
pub fn configure_fetch_queue(max_in_flight: usize, min_spacing: Duration) -> bool {
    let installed = FETCH_QUEUE
        .set(FetchQueue::new(max_in_flight, min_spacing))
        .is_ok();
    if !installed {
        debug!("fetch queue already configured, keeping existing limits");
    }
    installed
}

/// Source of content-addressed metadata documents.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Resolves one identifier to its document. Fails with a
    /// [`MetadataFetchError`] carrying the identifier; never synthesizes a
    /// partial document.
    async fn fetch_document(&self, identifier: &str) -> Result<TokenMetadata, MetadataFetchError>;

    /// Batch variant: results align with input positions, failed entries are
    /// `None` ("metadata unavailable", not absence of the token).
    async fn fetch_batch(
        &self,
        identifiers: &[String],
        concurrency: usize,
    ) -> Vec<Option<TokenMetadata>> {
        fetch_batch_impl(self, identifiers, concurrency).await
    }
}

/// Default-batch implementation lifted out of the `async_trait` method so the
/// buffered stream's futures carry an ordinary elided lifetime rather than the
/// desugared `'async_trait` bound (which defeats the stream combinator's
/// higher-ranked trait check).
async fn fetch_batch_impl<S: MetadataSource + ?Sized>(
    source: &S,
    identifiers: &[String],
    concurrency: usize,
) -> Vec<Option<TokenMetadata>> {
    let futures: Vec<_> = identifiers
        .iter()
        .map(|id| source.fetch_document(id))
        .collect();
    stream::iter(futures)
        .buffered(concurrency.max(1))
        .map(|res| match res {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!("batch metadata item failed: {}", e);
                None
            }
        })
        .collect()
        .await
}

/// Gateway-backed metadata resolver with a bounded document cache.
pub struct MetadataFetcher {
    client: reqwest::Client,
    gateway_base: String,
    cache: Arc<CacheManager>,
    max_retries: usize,
    retry_delay: Duration,
}

impl MetadataFetcher {
    pub fn new(cfg: &MetadataSettings) -> Result<Self, EngineError> {
        Self::with_cache(cfg, Arc::new(CacheManager::new(cfg.cache_capacity)))
    }

    pub fn with_cache(cfg: &MetadataSettings, cache: Arc<CacheManager>) -> Result<Self, EngineError> {
        configure_fetch_queue(cfg.max_in_flight, Duration::from_millis(cfg.min_spacing_ms));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| EngineError::terminal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            gateway_base: cfg.gateway_base.clone(),
            cache,
            max_retries: cfg.max_retries as usize,
            retry_delay: Duration::from_millis(cfg.retry_delay_ms),
        })
    }

    async fn fetch_once(
        &self,
        identifier: &str,
        url: &str,
    ) -> Result<TokenMetadata, MetadataFetchError> {
        let _permit = global_queue()
            .admit()
            .await
            .map_err(|e| MetadataFetchError::transient(identifier, e))?;
        debug!(identifier, url, "dispatching metadata fetch");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MetadataFetchError::transient(identifier, e))?;
        let status = response.status();
        if !status.is_success() {
            let err = if status.is_server_error() || status.as_u16() == 429 {
                MetadataFetchError::transient(identifier, format!("gateway returned {}", status))
            } else {
                MetadataFetchError::permanent(identifier, format!("gateway returned {}", status))
            };
            return Err(err);
        }
        response
            .json::<TokenMetadata>()
            .await
            .map_err(|e| MetadataFetchError::permanent(identifier, format!("malformed document: {}", e)))
    }

    async fn resolve(&self, identifier: &str) -> Result<TokenMetadata, MetadataFetchError> {
        let content_path = extract_content_path(identifier).ok_or_else(|| {
            MetadataFetchError::permanent(identifier, "unrecognized content identifier")
        })?;
        if let Some(hit) = self.cache.get_metadata(&content_path) {
            return Ok(hit);
        }
        let url = gateway_url(identifier, &self.gateway_base).ok_or_else(|| {
            MetadataFetchError::permanent(identifier, "could not derive gateway url")
        })?;

        let strategy = FixedInterval::new(self.retry_delay)
            .map(jitter)
            .take(self.max_retries);
        let mut doc = RetryIf::spawn(
            strategy,
            || self.fetch_once(identifier, &url),
            |e: &MetadataFetchError| {
                if e.transient {
                    metrics::increment_metadata_retry();
                }
                e.transient
            },
        )
        .await?;

        // Annotate the embedded image reference with its gateway URL, using
        // the same identifier extraction the document itself went through.
        if let Some(image) = doc.image.as_deref() {
            doc.image_gateway_url = gateway_url(image, &self.gateway_base);
        }
        self.cache.put_metadata(content_path, doc.clone());
        Ok(doc)
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }
}

#[async_trait]
impl MetadataSource for MetadataFetcher {
    async fn fetch_document(&self, identifier: &str) -> Result<TokenMetadata, MetadataFetchError> {
        self.resolve(identifier).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queue_grants_permits_in_bounded_numbers() {
        let queue = FetchQueue::new(2, Duration::from_millis(1));
        let p1 = queue.admit().await.unwrap();
        let _p2 = queue.admit().await.unwrap();
        // Third permit only becomes available once one is released.
        assert!(queue.semaphore.try_acquire().is_err());
        drop(p1);
        assert!(queue.semaphore.try_acquire().is_ok());
    }

    #[test]
    fn queue_limits_are_clamped() {
        let queue = FetchQueue::new(0, Duration::from_millis(0));
        assert_eq!(queue.semaphore.available_permits(), 1);
    }
}
