//! Durable storage subsystem
//!
//! A string-valued key-value adapter injected into every store that
//! persists, with a filesystem implementation and a volatile one.
//!
//! # Keys
//!
//! - `configs`: configuration snapshot list
//! - `user_notes`: annotations by owner
//! - `cookieConsent`: consent record
//! - `file_cache`: attachment payloads by owner and reference

mod backend;
mod errors;
mod json;
pub mod keys;
mod local;
mod memory;

pub use backend::{validate_key, KeyValueStore};
pub use errors::{PersistenceError, PersistenceResult};
pub use json::{read_json, try_read_json, write_json};
pub use local::FileStore;
pub use memory::MemoryStore;
