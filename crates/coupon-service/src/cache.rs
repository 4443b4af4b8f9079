//! # In-Process Cache
//!
//! Bounded LRU cache with a TTL and tag-based invalidation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  access_order (front = most recent)                                     │
//! │                                                                         │
//! │   [ FLAT20 ] [ WELCOME10 ] [ VITA15 ] ... [ OLDEST ]                    │
//! │       ▲                                       │                         │
//! │       │ get / insert moves a key here         ▼ evicted at capacity     │
//! │                                                                         │
//! │  Entries older than the TTL are treated as absent and dropped.         │
//! │  invalidate_by_tag("user:alice") drops every entry carrying that tag.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A capacity of zero disables the cache: every lookup misses and inserts
//! are ignored.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
    tags: HashSet<String>,
}

#[derive(Debug)]
struct Inner<V> {
    store: HashMap<String, Entry<V>>,
    access_order: VecDeque<String>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<V> Inner<V> {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
        self.access_order.push_front(key.to_string());
    }

    fn remove(&mut self, key: &str) -> Option<Entry<V>> {
        let entry = self.store.remove(key)?;
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
        Some(entry)
    }
}

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Thread-safe LRU + TTL cache keyed by `String`.
#[derive(Debug)]
pub struct TtlLruCache<V> {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> TtlLruCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        TtlLruCache {
            capacity,
            ttl,
            inner: Mutex::new(Inner {
                store: HashMap::new(),
                access_order: VecDeque::new(),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    /// A panic while holding the lock cannot leave the map half-written in a
    /// way that matters for a cache, so a poisoned lock is simply reused.
    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.duration_since(entry.inserted_at) >= self.ttl
    }

    /// Returns a clone of the live value under `key`.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.lock();

        let expired = match inner.store.get(key) {
            None => {
                inner.misses += 1;
                return None;
            }
            Some(entry) => self.is_expired(entry, now),
        };

        if expired {
            inner.remove(key);
            inner.misses += 1;
            debug!(key, "Cache entry expired");
            return None;
        }

        inner.hits += 1;
        inner.touch(key);
        inner.store.get(key).map(|entry| entry.value.clone())
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_tagged(key, value, std::iter::empty::<String>());
    }

    /// Stores `value` under `key` with invalidation tags.
    pub fn insert_tagged<I, T>(&self, key: impl Into<String>, value: V, tags: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        if self.capacity == 0 {
            return;
        }

        let key = key.into();
        let now = Instant::now();
        let mut inner = self.lock();

        inner.remove(&key);

        let expired: Vec<String> = inner
            .store
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(k, _)| k.clone())
            .collect();
        for k in expired {
            inner.remove(&k);
        }

        while inner.store.len() >= self.capacity {
            let Some(oldest) = inner.access_order.pop_back() else {
                break;
            };
            if inner.store.remove(&oldest).is_some() {
                inner.evictions += 1;
                debug!(key = %oldest, "Evicted cache entry");
            }
        }

        inner.touch(&key);
        inner.store.insert(
            key,
            Entry {
                value,
                inserted_at: now,
                tags: tags.into_iter().map(Into::into).collect(),
            },
        );
    }

    /// Drops the entry under `key`. Returns whether one existed.
    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drops every entry carrying `tag`. Returns how many were dropped.
    pub fn invalidate_by_tag(&self, tag: &str) -> usize {
        let mut inner = self.lock();
        let keys: Vec<String> = inner
            .store
            .iter()
            .filter(|(_, entry)| entry.tags.contains(tag))
            .map(|(k, _)| k.clone())
            .collect();

        let removed = keys.iter().filter(|k| inner.remove(k).is_some()).count();
        if removed > 0 {
            debug!(tag, removed, "Invalidated cache entries by tag");
        }
        removed
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.store.clear();
        inner.access_order.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            size: inner.store.len(),
            capacity: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
