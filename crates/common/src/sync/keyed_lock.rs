//! Async mutual exclusion scoped by string key
//!
//! `KeyedLock` hands out one `tokio::sync::Mutex` per key so that work for
//! different keys proceeds in parallel while work for the same key is
//! serialized. Callers that arrive while the lock is held wait for the holder
//! to finish instead of racing it.
//!
//! Entries live only while some task holds or waits on them; the last guard
//! out removes its key from the registry.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Registry of per-key async mutexes
#[derive(Debug, Default)]
pub struct KeyedLock {
    locks: Arc<LockMap>,
}

/// Guard returned by [`KeyedLock::lock`]; the key is released on drop.
#[derive(Debug)]
pub struct KeyedGuard {
    key: String,
    locks: Arc<LockMap>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedGuard {
    /// Key this guard holds.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        // Release the mutex first so its Arc no longer counts as a holder.
        drop(self.guard.take());
        // The check runs under the shard lock, and waiters clone the Arc under
        // that same lock, so a waited-on entry is never removed.
        let removed =
            self.locks.remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1).is_some();
        trace!(key = %self.key, removed, "keyed lock released");
    }
}

impl KeyedLock {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting if another task holds it.
    pub async fn lock(&self, key: &str) -> KeyedGuard {
        let mutex = self.mutex_for(key);
        let guard = mutex.lock_owned().await;
        trace!(key, "keyed lock acquired");
        KeyedGuard { key: key.to_string(), locks: Arc::clone(&self.locks), guard: Some(guard) }
    }

    /// Number of keys currently held or waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key is held or waited on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn mutex_for(&self, key: &str) -> Arc<Mutex<()>> {
        // Clone the Arc out so no shard guard is held across an await.
        self.locks.entry(key.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}
