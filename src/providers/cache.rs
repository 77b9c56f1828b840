/*!
 * Verse text caching.
 *
 * Wraps any `VerseLookup` so repeated references within a sermon (or a
 * folder of sermons) hit the remote service once. Failures are not cached.
 */

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{VerseLookup, VerseQuery};

/// Caching decorator for a verse lookup.
#[derive(Debug, Clone)]
pub struct CachedVerseLookup {
    inner: Arc<dyn VerseLookup>,

    cache: Arc<RwLock<HashMap<VerseQuery, String>>>,

    hits: Arc<RwLock<usize>>,

    misses: Arc<RwLock<usize>>,

    enabled: bool,
}

impl CachedVerseLookup {
    pub fn new(inner: Arc<dyn VerseLookup>) -> Self {
        Self::with_enabled(inner, true)
    }

    pub fn with_enabled(inner: Arc<dyn VerseLookup>, enabled: bool) -> Self {
        Self {
            inner,
            cache: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            enabled,
        }
    }

    fn cached(&self, query: &VerseQuery) -> Option<String> {
        let cache = self.cache.read();
        match cache.get(query) {
            Some(text) => {
                *self.hits.write() += 1;
                debug!("Verse cache hit for {}", query.reference);
                Some(text.clone())
            }
            None => {
                *self.misses.write() += 1;
                debug!("Verse cache miss for {}", query.reference);
                None
            }
        }
    }

    /// (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };
        (hits, misses, hit_rate)
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn clear(&self) {
        self.cache.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;
        debug!("Verse cache cleared");
    }
}

#[async_trait]
impl VerseLookup for CachedVerseLookup {
    async fn lookup(&self, query: &VerseQuery) -> Result<String, ProviderError> {
        if !self.enabled {
            return self.inner.lookup(query).await;
        }
        if let Some(text) = self.cached(query) {
            return Ok(text);
        }

        let text = self.inner.lookup(query).await?;
        self.cache.write().insert(query.clone(), text.clone());
        Ok(text)
    }
}
