// Engine facade: ties enumeration, hydration, snapshot management, and the
// query pipeline together behind the interface the rest of the system
// consumes.

use crate::chain_reader::LedgerReader;
use crate::error::EngineError;
use crate::event_watcher::{ChangeCallback, EventWatcher, Subscription};
use crate::hydrator::Hydrator;
use crate::metrics;
use crate::query::{run_query, Page, QueryState};
use crate::types::{Catalog, CatalogEntry, SyncScope};
use arc_swap::ArcSwap;
use log::{info, warn};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Marketplace catalog engine.
///
/// Holds the current catalog snapshot behind an `ArcSwap`: readers always
/// see a complete snapshot, and replacing it is atomic. Concurrent
/// synchronization cycles are deliberately not serialized — each produces
/// its own snapshot and the last write wins. An older cycle whose network
/// calls finish later can momentarily regress a fresher snapshot to a
/// staler one; staleness is tolerated here and a serializing lock is not.
pub struct CatalogEngine<R: LedgerReader> {
    hydrator: Hydrator<R>,
    watcher: Option<EventWatcher>,
    snapshot: ArcSwap<Catalog>,
    last_sync_error: Mutex<Option<String>>,
}

impl<R: LedgerReader> CatalogEngine<R> {
    pub fn new(hydrator: Hydrator<R>) -> Self {
        Self {
            hydrator,
            watcher: None,
            snapshot: ArcSwap::from_pointee(Catalog::new(SyncScope::ActiveMarket)),
            last_sync_error: Mutex::new(None),
        }
    }

    pub fn with_event_watcher(mut self, watcher: EventWatcher) -> Self {
        self.watcher = Some(watcher);
        self
    }

    /// Resolves the scope into a freshly hydrated catalog and installs it as
    /// the current snapshot.
    ///
    /// Per-item failures are dropped inside hydration and never fail the
    /// cycle. Enumeration-level failure leaves the previous snapshot in
    /// place and is surfaced with a readable message; callers keep showing
    /// the last good catalog while flagging the failed refresh.
    pub async fn synchronize(
        &self,
        scope: SyncScope,
        refresh: bool,
    ) -> Result<Arc<Catalog>, EngineError> {
        let started = Instant::now();
        let ids = match self.hydrator.enumerate(scope, refresh).await {
            Ok(ids) => ids,
            Err(e) => {
                let msg = format!("could not enumerate {}: {}", scope.label(), e);
                warn!("[CatalogEngine] {}", msg);
                metrics::increment_sync_cycle("enumeration_failed");
                *self.last_sync_error.lock().unwrap() = Some(msg.clone());
                return Err(EngineError::Sync(msg));
            }
        };

        let entries = self.hydrator.hydrate(&ids, refresh).await;
        let mut catalog = Catalog::new(scope);
        for entry in entries {
            catalog.insert(entry);
        }

        let previous = self.snapshot.load_full();
        let added = catalog
            .token_ids()
            .filter(|id| !previous.contains(id))
            .count();
        let removed = previous
            .token_ids()
            .filter(|id| !catalog.contains(id))
            .count();
        let dropped = ids.len() - catalog.len();
        info!(
            "[CatalogEngine] {} synchronized: {} entries ({} added, {} removed, {} dropped) in {:?}",
            scope.label(),
            catalog.len(),
            added,
            removed,
            dropped,
            started.elapsed()
        );
        metrics::increment_sync_cycle("ok");
        metrics::record_sync_duration(started.elapsed().as_secs_f64());
        metrics::set_catalog_size(scope.label(), catalog.len());

        let fresh = Arc::new(catalog);
        // Last write wins; see the type-level note on concurrent cycles.
        self.snapshot.store(Arc::clone(&fresh));
        *self.last_sync_error.lock().unwrap() = None;
        Ok(fresh)
    }

    /// Current snapshot; always complete, possibly stale.
    pub fn current(&self) -> Arc<Catalog> {
        self.snapshot.load_full()
    }

    /// Message from the most recent failed cycle, cleared by the next
    /// successful one. The query layer shows this alongside the last good
    /// catalog instead of clearing results.
    pub fn last_sync_error(&self) -> Option<String> {
        self.last_sync_error.lock().unwrap().clone()
    }

    /// Runs the pure query pipeline over the current snapshot.
    pub fn query(&self, state: &QueryState) -> Page<CatalogEntry> {
        run_query(&self.current(), state)
    }

    /// Registers the change callback with the event watcher. Fails when the
    /// engine was built without one.
    pub fn subscribe(&self, on_change: ChangeCallback) -> Result<Subscription, EngineError> {
        let watcher = self
            .watcher
            .as_ref()
            .ok_or_else(|| EngineError::terminal("engine has no event watcher configured"))?;
        Ok(watcher.subscribe(on_change))
    }

    pub fn reader(&self) -> &Arc<R> {
        self.hydrator.reader()
    }
}
