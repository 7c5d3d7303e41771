//! # Event-Driven Refresh
//!
//! Subscribes to the marketplace's mutation events over WebSocket and
//! funnels them, together with an optional long-period polling backstop,
//! into a single debounced `on_change` callback. The debounce absorbs
//! bursts of related events (approve + list in one user action) into one
//! re-sync and gives ledger propagation time to settle.

use crate::chain_reader::ChainContext;
use crate::contracts::{
    AuctionCancelledFilter, AuctionCreatedFilter, AuctionFinalizedFilter, BidPlacedFilter,
    ListedFilter, ListingCancelledFilter, PurchasedFilter,
};
use crate::metrics;
use crate::settings::Settings;
use anyhow::{Context, Result};
use ethers::contract::EthEvent;
use ethers::prelude::{Middleware, Provider, Ws};
use ethers::types::{Address, Filter, ValueOrArray, H256};
use futures_util::StreamExt;
use log::{debug, info, warn};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};

/// Callback invoked (debounced) when the ledger state may have changed.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Collapses bursts of kicks into a single callback invocation after a
/// quiet period of `delay`.
pub(crate) struct Debouncer {
    tx: mpsc::UnboundedSender<()>,
    pub(crate) task: JoinHandle<()>,
}

impl Debouncer {
    pub(crate) fn spawn(delay: Duration, on_fire: ChangeCallback) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let task = tokio::spawn(async move {
            loop {
                // Wait for the first kick of a burst.
                if rx.recv().await.is_none() {
                    break;
                }
                // Quiet-period loop: every further kick restarts the timer.
                loop {
                    tokio::select! {
                        _ = sleep(delay) => {
                            on_fire();
                            break;
                        }
                        more = rx.recv() => {
                            if more.is_none() {
                                return;
                            }
                        }
                    }
                }
            }
        });
        Self { tx, task }
    }

    pub(crate) fn kick(&self) {
        let _ = self.tx.send(());
    }

    pub(crate) fn sender(&self) -> mpsc::UnboundedSender<()> {
        self.tx.clone()
    }
}

/// Live subscription handle. `unsubscribe` removes all listeners and
/// cancels pending timers; safe to call more than once, and Drop tears
/// down too. Hydration cycles already in flight are unaffected.
pub struct Subscription {
    tasks: Vec<JoinHandle<()>>,
    active: AtomicBool,
}

impl Subscription {
    fn new(tasks: Vec<JoinHandle<()>>) -> Self {
        Self {
            tasks,
            active: AtomicBool::new(true),
        }
    }

    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            for task in &self.tasks {
                task.abort();
            }
            debug!("[EventWatcher] subscription torn down");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

pub struct EventWatcher {
    ctx: ChainContext,
    debounce: Duration,
    poll_interval: Option<Duration>,
}

impl EventWatcher {
    pub fn new(ctx: ChainContext, debounce: Duration, poll_interval: Option<Duration>) -> Self {
        Self {
            ctx,
            debounce,
            poll_interval,
        }
    }

    pub fn from_settings(ctx: ChainContext, settings: &Settings) -> Self {
        let poll_interval = if settings.refresh.enable_polling {
            Some(Duration::from_secs(settings.refresh.poll_interval_seconds.max(1)))
        } else {
            None
        };
        Self::new(
            ctx,
            Duration::from_secs(settings.refresh.debounce_seconds),
            poll_interval,
        )
    }

    /// topic0 signatures of the marketplace mutation events the watcher
    /// listens for.
    fn mutation_topics() -> Vec<H256> {
        vec![
            ListedFilter::signature(),
            AuctionCreatedFilter::signature(),
            BidPlacedFilter::signature(),
            AuctionFinalizedFilter::signature(),
            AuctionCancelledFilter::signature(),
            PurchasedFilter::signature(),
            ListingCancelledFilter::signature(),
        ]
    }

    pub fn subscribe(&self, on_change: ChangeCallback) -> Subscription {
        let debouncer = Debouncer::spawn(self.debounce, on_change);
        let kick = debouncer.sender();
        let mut tasks = Vec::new();

        match self.ctx.ws_url.clone() {
            Some(ws_url) => {
                let marketplace = self.ctx.marketplace;
                let kick_events = kick.clone();
                tasks.push(tokio::spawn(async move {
                    Self::event_loop(ws_url, marketplace, kick_events).await;
                }));
            }
            None => {
                info!("[EventWatcher] no ws url configured; relying on polling backstop");
            }
        }

        if let Some(period) = self.poll_interval {
            let kick_poll = kick;
            tasks.push(tokio::spawn(async move {
                let mut ticker = interval(period);
                ticker.tick().await; // the first tick fires immediately; skip it
                loop {
                    ticker.tick().await;
                    debug!("[EventWatcher] polling backstop tick");
                    metrics::increment_refresh_kick("poll");
                    let _ = kick_poll.send(());
                }
            }));
        }

        tasks.push(debouncer.task);
        Subscription::new(tasks)
    }

    /// Reconnect loop with jittered exponential backoff around one WS session.
    async fn event_loop(ws_url: String, marketplace: Address, kick: mpsc::UnboundedSender<()>) {
        let mut reconnect_delay = Duration::from_secs(1);
        let max_reconnect_delay = Duration::from_secs(60);
        loop {
            match Self::listen_once(&ws_url, marketplace, &kick).await {
                Ok(()) => {
                    reconnect_delay = Duration::from_secs(1);
                }
                Err(e) => {
                    warn!(
                        "[EventWatcher] subscription failed: {}. Reconnecting in {:?}...",
                        e, reconnect_delay
                    );
                }
            }
            let jitter_ms = rand::thread_rng().gen_range(0..250);
            sleep(reconnect_delay + Duration::from_millis(jitter_ms)).await;
            reconnect_delay = (reconnect_delay * 2).min(max_reconnect_delay);
        }
    }

    async fn listen_once(
        ws_url: &str,
        marketplace: Address,
        kick: &mpsc::UnboundedSender<()>,
    ) -> Result<()> {
        info!("[EventWatcher] connecting to {}", ws_url);
        let provider = Provider::<Ws>::connect(ws_url)
            .await
            .context("failed to connect to WebSocket provider")?;

        let filter = Filter::new()
            .address(marketplace)
            .topic0(ValueOrArray::Array(Self::mutation_topics()));
        let mut stream = provider
            .subscribe_logs(&filter)
            .await
            .context("failed to subscribe to marketplace logs")?;
        info!("[EventWatcher] subscribed to marketplace mutation events");

        while let Some(log) = stream.next().await {
            debug!(
                "[EventWatcher] marketplace event {:?} in block {:?}",
                log.topics.first(),
                log.block_number
            );
            metrics::increment_refresh_kick("event");
            let _ = kick.send(());
        }
        warn!("[EventWatcher] event stream ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_callback() -> (ChangeCallback, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_in = Arc::clone(&count);
        let cb: ChangeCallback = Arc::new(move || {
            count_in.fetch_add(1, Ordering::SeqCst);
        });
        (cb, count)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_kicks_fires_once() {
        let (cb, count) = counting_callback();
        let debouncer = Debouncer::spawn(Duration::from_secs(4), cb);

        debouncer.kick();
        sleep(Duration::from_millis(500)).await;
        debouncer.kick();
        sleep(Duration::from_secs(5)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        debouncer.task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn separated_kicks_fire_separately() {
        let (cb, count) = counting_callback();
        let debouncer = Debouncer::spawn(Duration::from_secs(4), cb);

        debouncer.kick();
        sleep(Duration::from_secs(5)).await;
        debouncer.kick();
        sleep(Duration::from_secs(5)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
        debouncer.task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn no_kick_no_fire() {
        let (cb, count) = counting_callback();
        let debouncer = Debouncer::spawn(Duration::from_secs(4), cb);
        sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        debouncer.task.abort();
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let (cb, _count) = counting_callback();
        let debouncer = Debouncer::spawn(Duration::from_secs(4), cb);
        let sub = Subscription::new(vec![debouncer.task]);
        assert!(sub.is_active());
        sub.unsubscribe();
        assert!(!sub.is_active());
        // Second call is a no-op, not a panic.
        sub.unsubscribe();
    }
}
