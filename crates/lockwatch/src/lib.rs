//! Named critical sections and a liveness canary for them.

pub mod canary;
pub mod registry;

pub use canary::{CanaryConfig, CanaryError, DeadlockCanary};
pub use registry::{KeyedLockGuard, KeyedLocks};
