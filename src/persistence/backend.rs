//! # Key-Value Store Trait

use super::errors::{PersistenceError, PersistenceResult};

/// Durable string-valued key-value storage
///
/// Values are JSON text. A missing key reads as `Ok(None)`.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read the value stored under key
    fn get(&self, key: &str) -> PersistenceResult<Option<String>>;

    /// Replace the value stored under key
    fn set(&self, key: &str, value: &str) -> PersistenceResult<()>;

    /// Remove key; removing a missing key is not an error
    fn remove(&self, key: &str) -> PersistenceResult<()>;

    /// All stored keys, sorted
    fn keys(&self) -> PersistenceResult<Vec<String>>;
}

/// Keys double as file names, so only `[A-Za-z0-9_-]` is allowed.
pub fn validate_key(key: &str) -> PersistenceResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidKey(key.to_string()))
    }
}
