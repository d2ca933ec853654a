//! Scheduler subsystem
//!
//! Poll-driven timers. Time comes from the caller, so behavior is fully
//! deterministic under a manual clock.

mod debounce;

pub use debounce::{Debouncer, PendingTask};
