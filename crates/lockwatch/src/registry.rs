use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Map from lock key to an async mutex.
///
/// Waiters on one key are served in FIFO order. Locks are created on first use
/// and never removed, so two callers naming the same key always contend on the
/// same mutex.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();
        if let Some(m) = locks.get(key) {
            return m.clone();
        }
        let m = Arc::new(AsyncMutex::new(()));
        locks.insert(key.to_string(), m.clone());
        m
    }

    /// Waits for the lock on `key`. Dropping the guard releases it.
    pub async fn lock(&self, key: &str) -> KeyedLockGuard {
        let guard = self.entry(key).lock_owned().await;
        KeyedLockGuard {
            key: key.to_string(),
            _guard: guard,
        }
    }

    /// Takes the lock on `key` only if nobody holds it.
    pub fn try_lock(&self, key: &str) -> Option<KeyedLockGuard> {
        let guard = self.entry(key).try_lock_owned().ok()?;
        Some(KeyedLockGuard {
            key: key.to_string(),
            _guard: guard,
        })
    }

    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

/// Held lock on one key.
#[derive(Debug)]
pub struct KeyedLockGuard {
    key: String,
    _guard: OwnedMutexGuard<()>,
}

impl KeyedLockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Releases the lock. Same as dropping the guard.
    pub fn unlock(self) {}
}
