//! Configuration Store
//!
//! Ordered snapshot list (oldest first) kept in memory and written through
//! to durable storage on every mutation. The mirror is loaded once at
//! startup; absent or corrupt storage starts empty.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::observability::{log_event_with_fields, Event};
use crate::persistence::{keys, read_json, write_json, KeyValueStore};
use crate::predicate::PredicateSet;
use crate::records::RecordStore;

use super::errors::{ConfigError, ConfigResult};
use super::snapshot::ConfigSnapshot;

/// Persisted, ordered list of configuration snapshots
#[derive(Debug)]
pub struct ConfigStore {
    backend: Arc<dyn KeyValueStore>,
    snapshots: Vec<ConfigSnapshot>,
}

impl ConfigStore {
    /// Loads the mirror from `backend`.
    ///
    /// Entries persisted without an id get one here, and the list is
    /// written back so the ids stay stable.
    pub fn open(backend: Arc<dyn KeyValueStore>) -> Self {
        let raw: Vec<Value> = read_json(backend.as_ref(), keys::CONFIGS).unwrap_or_default();
        let missing_ids = raw.iter().any(|entry| entry.get("id").is_none());

        let snapshots = match serde_json::from_value::<Vec<ConfigSnapshot>>(Value::Array(raw)) {
            Ok(snapshots) => snapshots,
            Err(e) => {
                let reason = e.to_string();
                log_event_with_fields(
                    Event::StorageReadFailed,
                    &[("key", keys::CONFIGS), ("reason", reason.as_str())],
                );
                Vec::new()
            }
        };

        let store = Self { backend, snapshots };
        if missing_ids && !store.snapshots.is_empty() {
            // Write-back failure is already logged; the ids just won't persist.
            let _ = store.persist();
        }
        store
    }

    /// Snapshots in insertion order
    pub fn list(&self) -> &[ConfigSnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&ConfigSnapshot> {
        self.snapshots.iter().find(|s| s.id == id)
    }

    /// Appends a snapshot and returns its id.
    ///
    /// On a write failure the snapshot stays in the mirror and the storage
    /// error is returned.
    pub fn save(&mut self, snapshot: ConfigSnapshot) -> ConfigResult<Uuid> {
        let id = snapshot.id;
        let count = snapshot.total_count.to_string();
        self.snapshots.push(snapshot);

        let id_text = id.to_string();
        log_event_with_fields(
            Event::SnapshotSaved,
            &[("id", id_text.as_str()), ("total_count", count.as_str())],
        );
        self.persist()?;
        Ok(id)
    }

    /// Predicate set captured by snapshot `id`, rebuilt for `store`.
    ///
    /// The live predicate set is the caller's; nothing here changes it.
    pub fn load(&self, id: Uuid, store: &RecordStore) -> ConfigResult<PredicateSet> {
        let snapshot = self.get(id).ok_or(ConfigError::NotFound(id))?;
        let id_text = id.to_string();
        log_event_with_fields(Event::SnapshotLoaded, &[("id", id_text.as_str())]);
        Ok(snapshot.restore(store))
    }

    pub fn delete(&mut self, id: Uuid) -> ConfigResult<()> {
        let position = self
            .snapshots
            .iter()
            .position(|s| s.id == id)
            .ok_or(ConfigError::NotFound(id))?;
        self.snapshots.remove(position);

        let id_text = id.to_string();
        log_event_with_fields(Event::SnapshotDeleted, &[("id", id_text.as_str())]);
        self.persist()
    }

    pub fn clear_all(&mut self) -> ConfigResult<()> {
        let removed = self.snapshots.len().to_string();
        self.snapshots.clear();
        log_event_with_fields(Event::SnapshotsCleared, &[("removed", removed.as_str())]);
        self.persist()
    }

    fn persist(&self) -> ConfigResult<()> {
        write_json(self.backend.as_ref(), keys::CONFIGS, &self.snapshots)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::persistence::MemoryStore;
    use crate::records::{CellValue, ColumnDescriptor, ColumnLayout};

    fn records() -> RecordStore {
        let layout = ColumnLayout::new("t", vec![ColumnDescriptor::membership("occupation", "Occupation")]);
        RecordStore::new(
            vec!["Occupation".into()],
            vec![vec![CellValue::from("Cook")], vec![CellValue::from("Pilot")]],
            layout,
        )
        .unwrap()
    }

    fn snapshot(set: &PredicateSet, count: usize) -> ConfigSnapshot {
        let clock = ManualClock::at_millis(1_000);
        ConfigSnapshot::capture(set, "SELECT Occupation FROM t;", count, clock.now(), None)
    }

    #[test]
    fn test_save_list_in_insertion_order() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = ConfigStore::open(backend.clone());
        let records = records();
        let set = PredicateSet::for_store(&records);

        let first = store.save(snapshot(&set, 2)).unwrap();
        let second = store.save(snapshot(&set, 1)).unwrap();

        let ids: Vec<Uuid> = store.list().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert_eq!(backend.write_count(), 2);
    }

    #[test]
    fn test_mirror_reloads_from_backend() {
        let backend = Arc::new(MemoryStore::new());
        let records = records();
        let mut set = PredicateSet::for_store(&records);
        set.toggle_membership(&records, "occupation", "Pilot");

        let id = {
            let mut store = ConfigStore::open(backend.clone());
            store.save(snapshot(&set, 1)).unwrap()
        };

        let reopened = ConfigStore::open(backend);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.load(id, &records).unwrap(), set);
    }

    #[test]
    fn test_corrupt_storage_starts_empty() {
        let backend = Arc::new(MemoryStore::with_value(keys::CONFIGS, "not json"));
        let store = ConfigStore::open(backend);
        assert!(store.is_empty());

        let backend = Arc::new(MemoryStore::with_value(keys::CONFIGS, r#"[{"bogus": true}]"#));
        assert!(ConfigStore::open(backend).is_empty());
    }

    #[test]
    fn test_entries_without_ids_get_stable_ids() {
        let legacy = r#"[{"selectedOccupations":["Cook"],"ageFilter":[0,100],"nameFilter":"",
            "sortConfig":{"key":null,"direction":"ascending"},"caseSensitive":false,
            "sqlSchema":"","totalCount":1,"timestamp":"2024-01-01T00:00:00.000Z"}]"#;
        let backend = Arc::new(MemoryStore::with_value(keys::CONFIGS, legacy));

        let first = ConfigStore::open(backend.clone()).list()[0].id;
        let second = ConfigStore::open(backend).list()[0].id;
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_id_not_found() {
        let mut store = ConfigStore::open(Arc::new(MemoryStore::new()));
        let id = Uuid::new_v4();
        assert_eq!(store.delete(id), Err(ConfigError::NotFound(id)));
        assert!(matches!(
            store.load(id, &records()),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_and_clear_all() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = ConfigStore::open(backend.clone());
        let records = records();
        let set = PredicateSet::for_store(&records);

        let a = store.save(snapshot(&set, 2)).unwrap();
        let b = store.save(snapshot(&set, 2)).unwrap();
        store.delete(a).unwrap();
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.list()[0].id, b);

        store.clear_all().unwrap();
        assert!(ConfigStore::open(backend).is_empty());
    }

    #[test]
    fn test_write_failure_keeps_mirror() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = ConfigStore::open(backend.clone());
        let records = records();

        backend.fail_writes(true);
        let result = store.save(snapshot(&PredicateSet::for_store(&records), 2));

        assert!(matches!(result, Err(ConfigError::Storage(_))));
        assert_eq!(store.len(), 1);
    }
}
