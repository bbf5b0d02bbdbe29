//! Critical task supervision.
//!
//! Every long-running piece of the watchdog runs as a named critical task. A
//! critical task that panics or returns an error takes the whole process down
//! through [`TaskManager::monitor`], which is how unrecoverable conditions
//! (a suspected deadlock, for one) reach an operator instead of being logged
//! and forgotten.

mod manager;

pub use manager::{CriticalTaskError, ShutdownGuard, ShutdownSignal, TaskExecutor, TaskManager};
