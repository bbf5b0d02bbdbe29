//! Deadlock canary for keyed locks.
//!
//! The lock registry can't tell us who holds a lock or for how long, so the
//! canary probes from the outside: every so often it takes and immediately
//! releases the lock for a watched key. If that takes longer than the bound,
//! somebody is sitting on the lock (or waiting in a cycle) and we stop the
//! process so an operator looks at it. Detection latency is at most one check
//! interval plus the bound.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use cswatch_tasks::TaskExecutor;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::{interval_at, timeout, MissedTickBehavior};
use tracing::*;

use crate::registry::KeyedLocks;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_DEADLOCK_BOUND: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, Debug)]
pub struct CanaryConfig {
    /// Time between two probes of the same key.
    pub check_interval: Duration,

    /// How long a single lock/unlock probe may take before it counts as a
    /// deadlock.
    pub deadlock_bound: Duration,
}

impl Default for CanaryConfig {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL,
            deadlock_bound: DEFAULT_DEADLOCK_BOUND,
        }
    }
}

#[derive(Debug, Error)]
pub enum CanaryError {
    #[error("possible deadlock on {key}: lock not acquired within {bound_ms} ms")]
    PossibleDeadlock { key: String, bound_ms: u64 },
}

#[derive(Clone, Debug, Default)]
struct CanaryState {
    last_check_started_at: Option<Instant>,
    checks_run: u64,
}

/// Probe bookkeeping, written by both recurring and one-off checks.
type StateMap = Arc<Mutex<HashMap<String, CanaryState>>>;

pub struct DeadlockCanary {
    locks: Arc<KeyedLocks>,
    executor: TaskExecutor,
    config: CanaryConfig,

    /// Keys with a recurring check running. Only `watch` adds to it.
    watched: Mutex<HashSet<String>>,
    checks: StateMap,
}

impl DeadlockCanary {
    /// `locks` must be the registry the rest of the process locks through,
    /// otherwise the canary never sees real contention.
    pub fn new(locks: Arc<KeyedLocks>, executor: TaskExecutor, config: CanaryConfig) -> Self {
        Self {
            locks,
            executor,
            config,
            watched: Mutex::default(),
            checks: Arc::default(),
        }
    }

    /// Starts periodic probing of `key`. Returns `false` if it was already
    /// being watched, in which case nothing changes.
    ///
    /// A tripped probe panics inside a critical task, which ends the process
    /// through the task manager.
    pub fn watch(&self, key: &str) -> bool {
        {
            let mut watched = self.watched.lock();
            if !watched.insert(key.to_string()) {
                debug!(%key, "already watching lock");
                return false;
            }
        }

        let locks = self.locks.clone();
        let checks = self.checks.clone();
        let config = self.config.clone();
        let owned_key = key.to_string();

        self.executor
            .spawn_critical_async(format!("lock-canary:{key}"), async move {
                canary_task(&locks, &checks, &owned_key, &config).await
            });

        info!(%key, interval = ?self.config.check_interval, "watching lock for deadlocks");
        true
    }

    /// Runs one probe of `key` right now.
    pub async fn check_once(&self, key: &str) -> Result<(), CanaryError> {
        mark_check_started(&self.checks, key);
        probe_lock(&self.locks, key, self.config.deadlock_bound).await
    }

    pub fn watched_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.watched.lock().iter().cloned().collect();
        keys.sort();
        keys
    }

    /// When the most recent probe of `key` began, if it ever ran.
    pub fn last_check_started_at(&self, key: &str) -> Option<Instant> {
        self.checks
            .lock()
            .get(key)
            .and_then(|s| s.last_check_started_at)
    }

    /// Number of probes of `key` started so far, recurring and one-off.
    pub fn checks_run(&self, key: &str) -> u64 {
        self.checks.lock().get(key).map_or(0, |s| s.checks_run)
    }
}

async fn canary_task(
    locks: &KeyedLocks,
    checks: &StateMap,
    key: &str,
    config: &CanaryConfig,
) -> anyhow::Result<()> {
    let start = tokio::time::Instant::now() + config.check_interval;
    let mut ticker = interval_at(start, config.check_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        mark_check_started(checks, key);

        if let Err(e) = probe_lock(locks, key, config.deadlock_bound).await {
            error!(%key, err = %e, "lock canary tripped");
            panic!("{e}");
        }
    }
}

fn mark_check_started(checks: &StateMap, key: &str) {
    let mut checks = checks.lock();
    let state = checks.entry(key.to_string()).or_default();
    state.last_check_started_at = Some(Instant::now());
    state.checks_run += 1;
}

/// Acquires and releases the lock on `key`, failing if that doesn't finish
/// within `bound`.
async fn probe_lock(locks: &KeyedLocks, key: &str, bound: Duration) -> Result<(), CanaryError> {
    match timeout(bound, locks.lock(key)).await {
        Ok(guard) => {
            guard.unlock();
            trace!(%key, "lock canary ok");
            Ok(())
        }
        Err(_) => Err(CanaryError::PossibleDeadlock {
            key: key.to_string(),
            bound_ms: bound.as_millis() as u64,
        }),
    }
}
