//! Attachment payload cache
//!
//! Payloads are kept base64-encoded, keyed owner → reference, in the shape
//! `{data, type, name, cachedAt}` with `cachedAt` in epoch milliseconds.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::AttachmentUpload;

/// One cached payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPayload {
    /// Base64 of the file bytes
    pub data: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub name: String,
    #[serde(rename = "cachedAt")]
    pub cached_at: i64,
}

impl CachedPayload {
    /// Decoded bytes, or `None` if the stored base64 is damaged
    pub fn bytes(&self) -> Option<Vec<u8>> {
        STANDARD.decode(&self.data).ok()
    }
}

/// Owner → reference → payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayloadCache {
    entries: BTreeMap<String, BTreeMap<String, CachedPayload>>,
}

impl PayloadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        owner: &str,
        reference: &str,
        upload: &AttachmentUpload,
        now: DateTime<Utc>,
    ) {
        let entry = CachedPayload {
            data: STANDARD.encode(&upload.data),
            mime_type: upload.mime_type.clone(),
            name: upload.name.clone(),
            cached_at: now.timestamp_millis(),
        };
        self.entries
            .entry(owner.to_string())
            .or_default()
            .insert(reference.to_string(), entry);
    }

    pub fn get(&self, owner: &str, reference: &str) -> Option<&CachedPayload> {
        self.entries.get(owner)?.get(reference)
    }

    /// Drops every payload of one owner; returns how many
    pub fn clear(&mut self, owner: &str) -> usize {
        self.entries.remove(owner).map(|m| m.len()).unwrap_or(0)
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Total cached payloads
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};

    #[test]
    fn test_entry_shape() {
        let clock = ManualClock::at_millis(42);
        let mut cache = PayloadCache::new();
        let upload = AttachmentUpload::new("a.csv", "text/csv", b"x,y".to_vec());
        cache.insert("row-1", "row-1/42.csv", &upload, clock.now());

        let value = serde_json::to_value(&cache).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "row-1": {
                    "row-1/42.csv": {"data": "eCx5", "type": "text/csv", "name": "a.csv", "cachedAt": 42}
                }
            })
        );
        assert_eq!(cache.get("row-1", "row-1/42.csv").unwrap().bytes().unwrap(), b"x,y");
    }

    #[test]
    fn test_clear_owner_and_all() {
        let clock = ManualClock::at_millis(0);
        let mut cache = PayloadCache::new();
        let upload = AttachmentUpload::new("a.png", "image/png", vec![1, 2]);
        cache.insert("a", "a/1.png", &upload, clock.now());
        cache.insert("a", "a/2.png", &upload, clock.now());
        cache.insert("b", "b/1.png", &upload, clock.now());

        assert_eq!(cache.clear("a"), 2);
        assert_eq!(cache.len(), 1);
        cache.clear_all();
        assert!(cache.is_empty());
    }
}
