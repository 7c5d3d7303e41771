use crate::metrics;
use crate::types::TokenMetadata;
use log::debug;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Bounded cache for resolved metadata documents.
///
/// Content-addressed identifiers name immutable documents, so entries are
/// never invalidated; the LRU policy only bounds memory.
#[derive(Debug)]
pub struct CacheManager {
    metadata_cache: Mutex<LruCache<String, TokenMetadata>>,
}

impl CacheManager {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1");
        Self {
            metadata_cache: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn get_metadata(&self, content_path: &str) -> Option<TokenMetadata> {
        let mut guard = self.metadata_cache.lock().unwrap();
        match guard.get(content_path) {
            Some(doc) => {
                metrics::increment_cache_hit("metadata");
                Some(doc.clone())
            }
            None => {
                metrics::increment_cache_miss("metadata");
                None
            }
        }
    }

    pub fn put_metadata(&self, content_path: String, doc: TokenMetadata) {
        let mut guard = self.metadata_cache.lock().unwrap();
        if guard.put(content_path, doc).is_none() && guard.len() == guard.cap().get() {
            debug!("metadata cache at capacity ({}), evicting LRU entries", guard.cap());
        }
    }

    pub fn len(&self) -> usize {
        self.metadata_cache.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
