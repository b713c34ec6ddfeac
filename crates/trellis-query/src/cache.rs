//! Shared query cache.
//!
//! Entries are keyed by the rendered [`QueryKey`] and hold the JSON form of
//! the provider response. The cache is mutated only through `set`,
//! `update_where`, `invalidate*` and `remove`; every mutation is reported to
//! registered listeners after the lock is released.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use trellis_core::providers::HttpResult;
use trellis_core::{Clock, Result, SystemClock};

use crate::key::QueryKey;

/// A cached query result.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Key of the query.
    pub key: QueryKey,
    /// Response as JSON.
    pub data: Value,
    /// When the data was stored.
    pub updated_at: DateTime<Utc>,
    /// Marked for refetch.
    pub stale: bool,
}

/// Change reported to cache listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// An entry was written.
    Updated(QueryKey),
    /// Entries were marked stale.
    Invalidated(Vec<QueryKey>),
    /// An entry was dropped.
    Removed(QueryKey),
}

/// Handle returned by [`QueryCache::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheListenerId(u64);

/// Values of a set of entries, for rolling back optimistic updates.
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    entries: Vec<(QueryKey, Value)>,
}

impl CacheSnapshot {
    /// Number of captured entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type CacheListener = Arc<dyn Fn(&CacheEvent) + Send + Sync>;

struct CacheInner {
    entries: RwLock<BTreeMap<String, CacheEntry>>,
    listeners: Mutex<BTreeMap<CacheListenerId, CacheListener>>,
    next_listener: AtomicU64,
    stale_time: Duration,
    clock: Arc<dyn Clock>,
}

/// Cloneable handle to the shared cache.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(Duration::ZERO, Arc::new(SystemClock))
    }
}

impl QueryCache {
    /// Cache whose entries stay fresh for `stale_time`.
    pub fn new(stale_time: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: RwLock::new(BTreeMap::new()),
                listeners: Mutex::new(BTreeMap::new()),
                next_listener: AtomicU64::new(0),
                stale_time,
                clock,
            }),
        }
    }

    /// Entry for `key`.
    pub fn get(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.inner.entries.read().get(key.as_str()).cloned()
    }

    /// Cached data for `key`, decoded.
    pub fn get_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<Option<T>> {
        match self.get(key) {
            Some(entry) => Ok(Some(serde_json::from_value(entry.data)?)),
            None => Ok(None),
        }
    }

    /// Whether `key` has data that is neither invalidated nor older than the
    /// stale time.
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        let now = self.inner.clock.now();
        self.inner
            .entries
            .read()
            .get(key.as_str())
            .is_some_and(|entry| {
                !entry.stale
                    && (now - entry.updated_at)
                        .to_std()
                        .is_ok_and(|age| age < self.inner.stale_time)
            })
    }

    /// Store data for `key`, replacing any previous entry.
    pub fn set(&self, key: &QueryKey, data: Value) {
        let entry = CacheEntry {
            key: key.clone(),
            data,
            updated_at: self.inner.clock.now(),
            stale: false,
        };
        self.inner
            .entries
            .write()
            .insert(key.as_str().to_string(), entry);
        self.emit(&CacheEvent::Updated(key.clone()));
    }

    /// Return fresh cached data, or run `fetcher` and cache its result.
    ///
    /// Failed fetches leave the cache untouched.
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = HttpResult<T>>,
    {
        if self.is_fresh(key) {
            if let Some(cached) = self.get_data(key)? {
                tracing::debug!(key = %key, "cache hit");
                return Ok(cached);
            }
        }

        tracing::debug!(key = %key, "fetching");
        let fresh = fetcher().await?;
        self.set(key, serde_json::to_value(&fresh)?);
        Ok(fresh)
    }

    /// Rewrite the data of every entry whose key satisfies `predicate`.
    /// Returns the previous values so the change can be rolled back.
    pub fn update_where(
        &self,
        predicate: impl Fn(&QueryKey) -> bool,
        mut update: impl FnMut(&QueryKey, &mut Value),
    ) -> CacheSnapshot {
        let mut snapshot = CacheSnapshot::default();
        {
            let mut entries = self.inner.entries.write();
            for entry in entries.values_mut().filter(|e| predicate(&e.key)) {
                snapshot.entries.push((entry.key.clone(), entry.data.clone()));
                update(&entry.key, &mut entry.data);
            }
        }
        for (key, _) in &snapshot.entries {
            self.emit(&CacheEvent::Updated(key.clone()));
        }
        snapshot
    }

    /// Put back the values captured by [`update_where`](Self::update_where).
    pub fn restore(&self, snapshot: CacheSnapshot) {
        {
            let mut entries = self.inner.entries.write();
            for (key, data) in &snapshot.entries {
                if let Some(entry) = entries.get_mut(key.as_str()) {
                    entry.data = data.clone();
                }
            }
        }
        for (key, _) in snapshot.entries {
            self.emit(&CacheEvent::Updated(key));
        }
    }

    /// Mark every entry whose key satisfies `predicate` as stale.
    pub fn invalidate(&self, predicate: impl Fn(&QueryKey) -> bool) -> usize {
        let keys: Vec<QueryKey> = {
            let mut entries = self.inner.entries.write();
            entries
                .values_mut()
                .filter(|e| predicate(&e.key))
                .map(|e| {
                    e.stale = true;
                    e.key.clone()
                })
                .collect()
        };
        let count = keys.len();
        if count > 0 {
            self.emit(&CacheEvent::Invalidated(keys));
        }
        count
    }

    /// Mark every resource-hook entry of `resource` as stale.
    pub fn invalidate_resource(&self, resource: &str) -> usize {
        let count = self.invalidate(|key| key.matches_resource(resource));
        tracing::debug!(resource, count, "invalidated cached queries");
        count
    }

    /// Drop the entry for `key`.
    pub fn remove(&self, key: &QueryKey) -> bool {
        let removed = self.inner.entries.write().remove(key.as_str()).is_some();
        if removed {
            self.emit(&CacheEvent::Removed(key.clone()));
        }
        removed
    }

    /// Keys of the resource-hook entries of `resource`.
    pub fn keys_for_resource(&self, resource: &str) -> Vec<QueryKey> {
        self.inner
            .entries
            .read()
            .values()
            .filter(|e| e.key.matches_resource(resource))
            .map(|e| e.key.clone())
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    /// Register a listener called after every change.
    pub fn subscribe(
        &self,
        listener: impl Fn(&CacheEvent) + Send + Sync + 'static,
    ) -> CacheListenerId {
        let id = CacheListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.lock().insert(id, Arc::new(listener));
        id
    }

    /// Remove a listener; returns whether it was registered.
    pub fn unsubscribe(&self, id: CacheListenerId) -> bool {
        self.inner.listeners.lock().remove(&id).is_some()
    }

    fn emit(&self, event: &CacheEvent) {
        let listeners: Vec<CacheListener> = self.inner.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener(event);
        }
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .field("stale_time", &self.inner.stale_time)
            .finish_non_exhaustive()
    }
}
