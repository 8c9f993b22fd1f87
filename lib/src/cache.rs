//! Cache for public listings.
//!
//! Entries expire after the configured time to live. Every project or blog
//! write clears the cache wholesale, which is coarse but never serves a
//! listing older than the last write.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use fnv::FnvHashMap;

use crate::Result;

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    expires: Instant,
}

pub struct ListCache {
    ttl: Duration,
    entries: RwLock<FnvHashMap<String, Entry>>,
    /// Bumped by every [`ListCache::clear`]. A value loaded before a clear
    /// is not stored.
    generation: AtomicU64,
}

impl ListCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(FnvHashMap::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &crate::config::Cache) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs))
    }

    /// Returns the live value stored under `key`, if it has the requested
    /// type.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(key)?;
        if entry.expires <= Instant::now() {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    pub fn insert<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        let entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Self::store(entries, self.ttl, key.into(), value);
    }

    fn store<T: Send + Sync + 'static>(
        mut entries: std::sync::RwLockWriteGuard<'_, FnvHashMap<String, Entry>>,
        ttl: Duration,
        key: String,
        value: T,
    ) {
        let now = Instant::now();
        entries.retain(|_, e| e.expires > now);
        entries.insert(
            key,
            Entry {
                value: Arc::new(value),
                expires: now + ttl,
            },
        );
    }

    /// Returns the cached value or computes and stores it. Failures are not
    /// cached.
    pub fn get_or_try_insert<T, F>(&self, key: &str, load: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.get::<T>(key) {
            tracing::trace!(key, "list cache hit");
            return Ok(value);
        }
        let generation = self.generation.load(Ordering::Acquire);
        let value = load()?;
        let entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if self.generation.load(Ordering::Acquire) == generation {
            Self::store(entries, self.ttl, key.to_string(), value.clone());
        } else {
            tracing::trace!(key, "list cache cleared during load, not storing");
        }
        Ok(value)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        self.generation.fetch_add(1, Ordering::AcqRel);
        if !entries.is_empty() {
            tracing::debug!(entries = entries.len(), "list cache cleared");
        }
        entries.clear();
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|e| e.expires > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ListCache {
    fn default() -> Self {
        Self::from_config(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_expire() {
        let cache = ListCache::new(Duration::from_millis(20));
        cache.insert("projects", vec![1, 2, 3]);
        assert_eq!(cache.get::<Vec<i32>>("projects"), Some(vec![1, 2, 3]));
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get::<Vec<i32>>("projects"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let cache = ListCache::new(Duration::from_secs(60));
        cache.insert("projects", 1u8);
        cache.insert("blog", 2u8);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.get::<u8>("projects").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn wrong_type_is_a_miss() {
        let cache = ListCache::new(Duration::from_secs(60));
        cache.insert("projects", "text".to_string());
        assert_eq!(cache.get::<u32>("projects"), None);
    }

    #[test]
    fn loader_runs_once_and_errors_are_not_cached() {
        let cache = ListCache::new(Duration::from_secs(60));
        let failed: Result<u32> =
            cache.get_or_try_insert("n", || Err(crate::ErrorKind::Unexpected.into()));
        assert!(failed.is_err());

        let mut calls = 0;
        for _ in 0..3 {
            let v = cache
                .get_or_try_insert("n", || {
                    calls += 1;
                    Ok(7u32)
                })
                .unwrap();
            assert_eq!(v, 7);
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn listing_loaded_across_a_write_is_not_kept() {
        let cache = ListCache::new(Duration::from_secs(60));
        let value = cache
            .get_or_try_insert("projects", || {
                // A save lands while the old listing is being read.
                cache.clear();
                Ok(vec!["old".to_string()])
            })
            .unwrap();
        assert_eq!(value, vec!["old".to_string()]);
        assert!(cache.get::<Vec<String>>("projects").is_none());

        let fresh = cache
            .get_or_try_insert("projects", || Ok(vec!["new".to_string()]))
            .unwrap();
        assert_eq!(fresh, vec!["new".to_string()]);
        assert_eq!(cache.get::<Vec<String>>("projects"), Some(fresh));
    }
}
