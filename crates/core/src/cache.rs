//! Read-through caching for values fetched from the object store.
//!
//! A [`ReadThroughCache`] maps a key to the last successfully loaded value.
//! Lookups that miss (or find an expired value) run the supplied loader and
//! store its result; loader errors are returned and nothing is stored, so the
//! next lookup tries again. Entries are only dropped by expiry or
//! [`ReadThroughCache::invalidate`]; there is no size bound.

use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;

/// When a cached value stops being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Kept for the lifetime of the cache.
    Never,
    /// Reloaded once this much time has passed since it was stored.
    AfterWrite(Duration),
}

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

pub struct ReadThroughCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    expiry: Expiry,
}

impl<K, V> ReadThroughCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(expiry: Expiry) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            expiry,
        }
    }

    fn is_fresh(&self, entry: &CacheEntry<V>) -> bool {
        match self.expiry {
            Expiry::Never => true,
            Expiry::AfterWrite(ttl) => entry.stored_at.elapsed() < ttl,
        }
    }

    /// Cached value for `key` if present and not expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.value.clone())
    }

    /// Return the cached value for `key`, loading and storing it on a miss.
    ///
    /// The lock is not held while `load` runs, so two concurrent misses for the
    /// same key may both load; the later result wins.
    pub async fn get_or_try_load<F, Fut, E>(&self, key: &K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = load().await?;
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.clone(),
            CacheEntry {
                value: value.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(value)
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.lock().await.remove(key);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn never_expiring_entries_load_once() {
        let cache = ReadThroughCache::<String, u32>::new(Expiry::Never);
        let loads = AtomicUsize::new(0);
        let key = "catalog".to_string();

        for _ in 0..3 {
            let value = cache
                .get_or_try_load(&key, || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn failed_loads_are_not_cached() {
        let cache = ReadThroughCache::<&str, u32>::new(Expiry::Never);

        let first = cache
            .get_or_try_load(&"k", || async { Err::<u32, _>("offline") })
            .await;
        assert_eq!(first, Err("offline"));
        assert!(cache.is_empty().await);

        let second = cache
            .get_or_try_load(&"k", || async { Ok::<_, &str>(1) })
            .await;
        assert_eq!(second, Ok(1));
    }

    #[tokio::test]
    async fn expired_entries_reload() {
        let cache = ReadThroughCache::<&str, u32>::new(Expiry::AfterWrite(Duration::ZERO));
        let loads = AtomicUsize::new(0);

        for _ in 0..2 {
            cache
                .get_or_try_load(&"url", || async {
                    Ok::<_, ()>(loads.fetch_add(1, Ordering::SeqCst) as u32)
                })
                .await
                .unwrap();
        }

        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get(&"url").await, None);
    }

    #[tokio::test]
    async fn invalidate_forces_a_reload() {
        let cache = ReadThroughCache::<&str, u32>::new(Expiry::Never);
        cache
            .get_or_try_load(&"k", || async { Ok::<_, ()>(1) })
            .await
            .unwrap();
        cache.invalidate(&"k").await;
        let value = cache
            .get_or_try_load(&"k", || async { Ok::<_, ()>(2) })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }
}
