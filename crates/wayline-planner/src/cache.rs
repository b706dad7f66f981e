//! Session-scoped cache for read-only capability calls.
//!
//! Observe and extract results are memoized by `(kind, query)`. An act call
//! does not clear the cache; it only marks it stale, and the next read of
//! either kind empties it before looking anything up.

use std::collections::HashMap;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use wayline_core::{ActionKind, CapabilityProvider};

/// Deterministic key of a cacheable call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `(kind, query)`. Act calls have no key.
    pub fn new(kind: ActionKind, query: &str) -> Option<Self> {
        if !kind.is_read_only() {
            return None;
        }

        let mut hasher = Sha256::new();
        hasher.update(kind.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(query.as_bytes());
        let digest = hasher.finalize();
        Some(Self(digest.iter().map(|b| format!("{:02x}", b)).collect()))
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    /// Times a stale cache was emptied.
    pub invalidations: usize,
}

/// Read cache for one planning session.
#[derive(Debug, Default)]
pub struct ActionCache {
    entries: HashMap<CacheKey, String>,
    pending_invalidation: bool,
    stats: CacheStats,
}

impl ActionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache pre-populated with `(kind, query, payload)` entries.
    /// Act entries are ignored.
    pub fn with_entries<Q, P>(entries: impl IntoIterator<Item = (ActionKind, Q, P)>) -> Self
    where
        Q: AsRef<str>,
        P: Into<String>,
    {
        let mut cache = Self::new();
        for (kind, query, payload) in entries {
            cache.put(kind, query.as_ref(), payload);
        }
        cache
    }

    /// Look up a read. Empties the cache first if an act made it stale.
    pub fn get(&mut self, kind: ActionKind, query: &str) -> Option<String> {
        let key = CacheKey::new(kind, query)?;
        self.flush_if_stale();

        match self.entries.get(&key) {
            Some(payload) => {
                self.stats.hits += 1;
                Some(payload.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store the result of a read. Act results are never stored.
    pub fn put(&mut self, kind: ActionKind, query: &str, payload: impl Into<String>) {
        let Some(key) = CacheKey::new(kind, query) else {
            return;
        };
        self.flush_if_stale();
        self.entries.insert(key, payload.into());
    }

    /// Record that page state may have changed. The cache is emptied on the next read.
    pub fn mark_stale(&mut self) {
        self.pending_invalidation = true;
    }

    /// Empty the cache right away.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.pending_invalidation = false;
        self.stats.invalidations += 1;
    }

    /// Whether an invalidation is pending.
    pub fn is_stale(&self) -> bool {
        self.pending_invalidation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Serve a capability call through the cache.
    ///
    /// Reads are answered from the cache when possible; misses go to the
    /// provider and successful results are stored. Acts always reach the
    /// provider and mark the cache stale, whether or not they succeed.
    pub async fn resolve(
        &mut self,
        kind: ActionKind,
        query: &str,
        provider: &dyn CapabilityProvider,
    ) -> anyhow::Result<String> {
        if kind.is_mutating() {
            let result = kind.invoke(provider, query).await;
            self.mark_stale();
            return result;
        }

        if let Some(payload) = self.get(kind, query) {
            debug!(kind = %kind, query, "action cache hit");
            return Ok(payload);
        }

        let payload = kind.invoke(provider, query).await?;
        self.put(kind, query, payload.clone());
        Ok(payload)
    }

    fn flush_if_stale(&mut self) {
        if self.pending_invalidation {
            debug!(entries = self.entries.len(), "flushing stale action cache");
            self.invalidate_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayline_core::RecordingCapabilityProvider;

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = CacheKey::new(ActionKind::Extract, "title").unwrap();
        let b = CacheKey::new(ActionKind::Extract, "title").unwrap();
        let c = CacheKey::new(ActionKind::Observe, "title").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.0.len(), 64);
        assert!(CacheKey::new(ActionKind::Act, "title").is_none());
    }

    #[test]
    fn test_act_is_never_cached() {
        let mut cache = ActionCache::new();
        cache.put(ActionKind::Act, "click login", "clicked");
        assert!(cache.is_empty());
        assert_eq!(cache.get(ActionKind::Act, "click login"), None);
    }

    #[test]
    fn test_mark_stale_is_lazy() {
        let mut cache = ActionCache::with_entries(vec![(ActionKind::Observe, "menu", "3 items")]);
        cache.mark_stale();

        // Nothing is cleared until the next read.
        assert_eq!(cache.len(), 1);
        assert!(cache.is_stale());

        assert_eq!(cache.get(ActionKind::Extract, "unrelated"), None);
        assert!(cache.is_empty());
        assert!(!cache.is_stale());
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[tokio::test]
    async fn test_repeated_extract_hits_cache() {
        let provider = RecordingCapabilityProvider::new().with_response(
            ActionKind::Extract,
            "headline",
            "Rust 2.0 released",
        );
        let mut cache = ActionCache::new();

        let first = cache
            .resolve(ActionKind::Extract, "headline", &provider)
            .await
            .unwrap();
        let second = cache
            .resolve(ActionKind::Extract, "headline", &provider)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.call_count(ActionKind::Extract), 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_reads_separated_by_reads_stay_cached() {
        let provider = RecordingCapabilityProvider::new();
        let mut cache = ActionCache::new();

        cache.resolve(ActionKind::Observe, "search box", &provider).await.unwrap();
        cache.resolve(ActionKind::Extract, "title", &provider).await.unwrap();
        cache.resolve(ActionKind::Observe, "search box", &provider).await.unwrap();

        assert_eq!(provider.call_count(ActionKind::Observe), 1);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_read_after_act_misses() {
        let provider = RecordingCapabilityProvider::new();
        let mut cache = ActionCache::new();

        cache.resolve(ActionKind::Observe, "search box", &provider).await.unwrap();
        cache.resolve(ActionKind::Extract, "title", &provider).await.unwrap();
        cache.resolve(ActionKind::Act, "type hello", &provider).await.unwrap();

        // The act only marks the cache stale.
        assert_eq!(cache.len(), 2);

        cache.resolve(ActionKind::Observe, "search box", &provider).await.unwrap();

        assert_eq!(provider.call_count(ActionKind::Observe), 2);
        // The whole cache was emptied, then repopulated with the fresh read.
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_read_is_not_stored() {
        let provider = RecordingCapabilityProvider::new().with_failure(
            ActionKind::Extract,
            "price",
            "element detached",
        );
        let mut cache = ActionCache::new();

        assert!(cache.resolve(ActionKind::Extract, "price", &provider).await.is_err());
        assert!(cache.resolve(ActionKind::Extract, "price", &provider).await.is_err());

        assert!(cache.is_empty());
        assert_eq!(provider.call_count(ActionKind::Extract), 2);
    }

    #[tokio::test]
    async fn test_failed_act_still_marks_stale() {
        let provider = RecordingCapabilityProvider::new().with_failure(
            ActionKind::Act,
            "submit form",
            "button disabled",
        );
        let mut cache = ActionCache::with_entries(vec![(ActionKind::Extract, "title", "Home")]);

        assert!(cache.resolve(ActionKind::Act, "submit form", &provider).await.is_err());
        assert!(cache.is_stale());
    }

    #[tokio::test]
    async fn test_injected_entries_are_served() {
        let provider = RecordingCapabilityProvider::new();
        let mut cache = ActionCache::with_entries(vec![(ActionKind::Extract, "title", "Cached")]);

        let output = cache
            .resolve(ActionKind::Extract, "title", &provider)
            .await
            .unwrap();

        assert_eq!(output, "Cached");
        assert!(provider.calls().is_empty());
    }
}
