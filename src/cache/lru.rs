//! Fixed-capacity least-recently-used cache.
//!
//! # Responsibilities
//! - Memoize expensive or I/O-bound results by string key
//! - Evict the least recently touched entry on overflow
//! - Support wholesale invalidation
//!
//! # Design Decisions
//! - Reads and writes both refresh recency (strict LRU)
//! - The lock is never held across a compute future; two concurrent misses
//!   for the same key both compute and the later insert wins
//! - A disabled cache computes every time (development mode)

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::observability::metrics;

struct Entry<V> {
    value: V,
    tick: u64,
}

struct LruState<V> {
    entries: HashMap<String, Entry<V>>,
    /// Recency order: tick → key, oldest first.
    recency: BTreeMap<u64, String>,
    tick: u64,
}

impl<V> LruState<V> {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

/// A bounded LRU cache keyed by string.
pub struct BoundedCache<V> {
    name: &'static str,
    capacity: usize,
    enabled: bool,
    state: Mutex<LruState<V>>,
}

impl<V: Clone> BoundedCache<V> {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            enabled: capacity > 0,
            state: Mutex::new(LruState {
                entries: HashMap::new(),
                recency: BTreeMap::new(),
                tick: 0,
            }),
        }
    }

    /// Create a cache that never stores anything.
    pub fn bypassed(name: &'static str) -> Self {
        let mut cache = Self::new(name, 0);
        cache.enabled = false;
        cache
    }

    fn lock(&self) -> MutexGuard<'_, LruState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a cached value, refreshing its recency.
    pub fn get(&self, key: &str) -> Option<V> {
        if !self.enabled {
            return None;
        }
        let mut state = self.lock();
        let tick = state.next_tick();
        let entry = state.entries.get_mut(key)?;
        let previous = std::mem::replace(&mut entry.tick, tick);
        let value = entry.value.clone();
        state.recency.remove(&previous);
        state.recency.insert(tick, key.to_string());
        Some(value)
    }

    /// Store a value, evicting the least recently used entry if full.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        if !self.enabled {
            return;
        }
        let key = key.into();
        let mut state = self.lock();
        let tick = state.next_tick();

        if let Some(previous) = state.entries.insert(key.clone(), Entry { value, tick }) {
            state.recency.remove(&previous.tick);
        }
        state.recency.insert(tick, key);

        while state.entries.len() > self.capacity {
            let Some((_, oldest)) = state.recency.pop_first() else {
                break;
            };
            state.entries.remove(&oldest);
            tracing::trace!(cache = self.name, key = %oldest, "Evicted cache entry");
        }
    }

    /// Return the cached value for `key`, or compute, store and return it.
    pub async fn get_or_insert_with<F, Fut>(&self, key: String, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.lookup(&key) {
            return value;
        }
        let value = compute().await;
        self.insert(key, value.clone());
        value
    }

    /// Like `get_or_insert_with`, but errors are returned without being cached.
    pub async fn try_get_or_insert_with<F, Fut, E>(&self, key: String, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }
        let value = compute().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    fn lookup(&self, key: &str) -> Option<V> {
        if !self.enabled {
            return None;
        }
        let found = self.get(key);
        tracing::trace!(cache = self.name, key, hit = found.is_some(), "Cache lookup");
        metrics::record_cache_lookup(self.name, found.is_some());
        found
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.recency.clear();
    }
}
