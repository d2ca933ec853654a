//! JSON encoding over the key-value store
//!
//! Reads never fail the caller: an unreadable or undecodable value is
//! logged and treated as absent. Writes report their error so the caller
//! can notify, and log it as well.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::observability::{log_event_with_fields, Event};

use super::backend::KeyValueStore;
use super::errors::{PersistenceError, PersistenceResult};

/// Decodes the value under `key`, or `None` if absent, unreadable or corrupt
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    match try_read_json(store, key) {
        Ok(value) => value,
        Err(e) => {
            let reason = e.to_string();
            log_event_with_fields(
                Event::StorageReadFailed,
                &[("key", key), ("reason", reason.as_str())],
            );
            None
        }
    }
}

/// Like [`read_json`] but reports why a present value could not be used
pub fn try_read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> PersistenceResult<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| PersistenceError::Corrupt(key.to_string(), e.to_string()))
}

/// Encodes and stores `value` under `key`
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> PersistenceResult<()> {
    let result = serde_json::to_string(value)
        .map_err(|e| PersistenceError::Encode(key.to_string(), e.to_string()))
        .and_then(|encoded| store.set(key, &encoded));

    if let Err(e) = &result {
        let reason = e.to_string();
        log_event_with_fields(
            Event::StorageWriteFailed,
            &[("key", key), ("reason", reason.as_str())],
        );
    }
    result
}
