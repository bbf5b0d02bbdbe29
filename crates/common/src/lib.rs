//! Crate includes reusable utils for the watchdog services that handle common
//! behavior, such as initializing the tracing framework, bounding provider
//! calls and deciding whether a provider failure is worth backing off for.

pub mod deadline;
pub mod env;
pub mod logging;
pub mod rate_limit;
pub mod retry;
