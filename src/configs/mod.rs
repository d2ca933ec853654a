//! Configuration Store subsystem
//!
//! Named, ordered snapshots of the predicate set. Loading hands a rebuilt
//! predicate set back to the caller; the store never touches live state.

mod errors;
mod snapshot;
mod store;

pub use errors::{ConfigError, ConfigResult};
pub use snapshot::ConfigSnapshot;
pub use store::ConfigStore;
