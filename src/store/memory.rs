//! In-process task store

use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::TaskStore;

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    counters: HashMap<String, u64>,
}

/// In-memory task store for tests and single-process embedding
///
/// Same semantics as [`super::SqliteStore`] — last-writer-wins overwrite,
/// TTL filtering on read, atomic counters — without any persistence.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked mid-write;
        // the map itself is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let inner = self.lock();
        Ok(inner.entries.get(key).is_some_and(|e| !e.is_expired(now)))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let now = Instant::now();
        let inner = self.lock();
        Ok(inner
            .entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone()))
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, StoreError> {
        let now = Instant::now();
        let inner = self.lock();
        Ok(keys
            .iter()
            .map(|key| {
                inner
                    .entries
                    .get(key)
                    .filter(|e| !e.is_expired(now))
                    .map(|e| e.value.clone())
            })
            .collect())
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        let now = Instant::now();
        let mut inner = self.lock();
        inner.entries.retain(|_, e| !e.is_expired(now));
        Ok(inner
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(_, e)| e.value.clone())
            .collect())
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), StoreError> {
        let entry = Entry {
            value: value.to_vec(),
            expires_at: ttl.map(|t| Instant::now() + t),
        };
        self.lock().entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock().entries.remove(key);
        Ok(())
    }

    async fn next_id(&self, counter: &str) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let value = inner.counters.entry(counter.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}
