//! Time-bounded cache for rendered feed fragments.
//!
//! Entries are never invalidated by writes: a snapshot stays visible until its
//! TTL runs out or the cache is cleared.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Arc<str>,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

#[derive(Debug)]
pub struct FeedCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<str>> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(self.ttl))
            .map(|entry| Arc::clone(&entry.value))
    }

    pub async fn insert(&self, key: &str, value: String) -> Arc<str> {
        let value: Arc<str> = Arc::from(value);
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired(self.ttl));
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: Arc::clone(&value),
                inserted_at: Instant::now(),
            },
        );
        value
    }

    /// Returns the live entry for `key`, or computes, stores and returns a new one.
    ///
    /// Concurrent misses may both compute; the last write wins.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: &str, compute: F) -> Result<Arc<str>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        if let Some(hit) = self.get(key).await {
            debug!(key, "feed cache hit");
            return Ok(hit);
        }
        debug!(key, "feed cache miss");
        let value = compute().await?;
        Ok(self.insert(key, value).await)
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
        debug!("feed cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn serves_snapshot_until_ttl_expires() {
        let cache = FeedCache::new(Duration::from_secs(20));
        let first = cache
            .get_or_try_insert_with("index_page:1", || async { Ok::<_, ()>("v1".to_string()) })
            .await
            .unwrap();
        assert_eq!(&*first, "v1");

        tokio::time::advance(Duration::from_secs(19)).await;
        let again = cache
            .get_or_try_insert_with("index_page:1", || async { Ok::<_, ()>("v2".to_string()) })
            .await
            .unwrap();
        assert_eq!(&*again, "v1");

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("index_page:1").await.is_none());
        let refreshed = cache
            .get_or_try_insert_with("index_page:1", || async { Ok::<_, ()>("v2".to_string()) })
            .await
            .unwrap();
        assert_eq!(&*refreshed, "v2");
    }

    #[tokio::test]
    async fn clear_drops_every_entry() {
        let cache = FeedCache::new(Duration::from_secs(20));
        cache.insert("a", "1".into()).await;
        cache.insert("b", "2".into()).await;
        assert_eq!(cache.get("b").await.as_deref(), Some("2"));

        cache.clear().await;
        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_none());
    }

    #[tokio::test]
    async fn failed_computation_is_not_cached() {
        let cache = FeedCache::new(Duration::from_secs(20));
        let err = cache
            .get_or_try_insert_with("k", || async { Err::<String, _>("boom") })
            .await
            .unwrap_err();
        assert_eq!(err, "boom");
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn zero_ttl_disables_caching() {
        let cache = FeedCache::new(Duration::ZERO);
        cache.insert("k", "v".into()).await;
        assert!(cache.get("k").await.is_none());
    }
}
