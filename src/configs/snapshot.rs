//! Configuration snapshot
//!
//! Persisted shape, camelCase on the wire:
//!
//! ```text
//! { id, label?, selectedOccupations, ageFilter: [min, max], nameFilter,
//!   sortConfig: {key, direction}, caseSensitive, sqlSchema, totalCount,
//!   timestamp, criteria? }
//! ```
//!
//! `selectedOccupations`, `ageFilter` and `nameFilter` mirror the
//! `occupation`, `age` and `name` dimensions so lists written by the
//! fixed-layout explorer stay loadable. `criteria` carries every dimension.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::iso8601;
use crate::predicate::{whole_pair, Criterion, PredicateSet, SortSpec};
use crate::records::{RangeBounds, RecordStore};

const OCCUPATION_KEY: &str = "occupation";
const AGE_KEY: &str = "age";
const NAME_KEY: &str = "name";

fn default_age_filter() -> [f64; 2] {
    let bounds = RangeBounds::default();
    [bounds.min, bounds.max]
}

/// Immutable capture of a predicate set with its schema string and count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub selected_occupations: Vec<String>,
    #[serde(default = "default_age_filter", with = "whole_pair")]
    pub age_filter: [f64; 2],
    #[serde(default)]
    pub name_filter: String,
    #[serde(default)]
    pub sort_config: SortSpec,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub sql_schema: String,
    #[serde(default)]
    pub total_count: usize,
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<BTreeMap<String, Criterion>>,
}

impl ConfigSnapshot {
    /// Captures `predicates` as a new snapshot
    pub fn capture(
        predicates: &PredicateSet,
        sql_schema: impl Into<String>,
        total_count: usize,
        timestamp: DateTime<Utc>,
        label: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            label,
            selected_occupations: predicates
                .selected(OCCUPATION_KEY)
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
            age_filter: predicates
                .range(AGE_KEY)
                .map(|(min, max)| [min, max])
                .unwrap_or_else(default_age_filter),
            name_filter: predicates.text(NAME_KEY).unwrap_or_default().to_string(),
            sort_config: predicates.sort(),
            case_sensitive: predicates.case_sensitive(),
            sql_schema: sql_schema.into(),
            total_count,
            timestamp,
            criteria: Some(predicates.criteria().clone()),
        }
    }

    /// Rebuilds the captured predicate set against `store`.
    ///
    /// Falls back to the legacy fields when `criteria` is absent; dimensions
    /// neither mentions keep their reset values.
    pub fn restore(&self, store: &RecordStore) -> PredicateSet {
        let criteria = match &self.criteria {
            Some(criteria) => criteria.clone(),
            None => self.legacy_criteria(),
        };
        PredicateSet::from_parts(store, criteria, self.case_sensitive, self.sort_config)
    }

    fn legacy_criteria(&self) -> BTreeMap<String, Criterion> {
        let mut criteria = BTreeMap::new();
        criteria.insert(
            OCCUPATION_KEY.to_string(),
            Criterion::Membership {
                allowed: self.selected_occupations.clone(),
            },
        );
        criteria.insert(
            AGE_KEY.to_string(),
            Criterion::Range {
                min: self.age_filter[0],
                max: self.age_filter[1],
            },
        );
        criteria.insert(
            NAME_KEY.to_string(),
            Criterion::Text {
                query: self.name_filter.clone(),
            },
        );
        criteria
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::records::{CaseMode, CellValue, ColumnDescriptor, ColumnLayout};
    use serde_json::json;

    fn store() -> RecordStore {
        let layout = ColumnLayout::new(
            "people",
            vec![
                ColumnDescriptor::search("name", "Name", CaseMode::FollowsFlag),
                ColumnDescriptor::range("age", "Age", 0.0, 100.0),
                ColumnDescriptor::membership("occupation", "Occupation"),
                ColumnDescriptor::membership("pet", "Pet"),
            ],
        );
        let row = |n: &str, a: i64, o: &str, p: &str| {
            vec![CellValue::from(n), CellValue::Int(a), CellValue::from(o), CellValue::from(p)]
        };
        RecordStore::new(
            vec!["Name".into(), "Age".into(), "Occupation".into(), "Pet".into()],
            vec![
                row("Alice", 30, "Engineer", "Cat"),
                row("Bob", 45, "Designer", "Dog"),
            ],
            layout,
        )
        .unwrap()
    }

    #[test]
    fn test_legacy_json_shape() {
        let store = store();
        let mut set = PredicateSet::for_store(&store);
        set.set_range(&store, "age", 30.0, 30.0);
        set.toggle_membership(&store, "occupation", "Engineer");
        set.set_text(&store, "name", "al");

        let clock = ManualClock::at_millis(1_700_000_000_000);
        let snapshot = ConfigSnapshot::capture(&set, "SELECT ...;", 1, clock.now(), None);
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["selectedOccupations"], json!(["Engineer"]));
        assert_eq!(value["ageFilter"], json!([30, 30]));
        assert_eq!(value["nameFilter"], json!("al"));
        assert_eq!(value["sortConfig"], json!({"key": null, "direction": "ascending"}));
        assert_eq!(value["caseSensitive"], json!(false));
        assert_eq!(value["sqlSchema"], json!("SELECT ...;"));
        assert_eq!(value["totalCount"], json!(1));
        assert_eq!(value["timestamp"], json!("2023-11-14T22:13:20.000Z"));
        assert!(value.get("label").is_none());
    }

    #[test]
    fn test_capture_restore_round_trip() {
        let store = store();
        let mut set = PredicateSet::for_store(&store);
        set.toggle_membership(&store, "pet", "Dog");
        set.set_range(&store, "age", 10.0, 50.0);
        set.set_case_sensitive(true);
        set.set_sort(&store, 1);
        set.set_sort(&store, 1);

        let clock = ManualClock::at_millis(1_712_345_678_901);
        let snapshot = ConfigSnapshot::capture(&set, "", 1, clock.now(), Some("dogs".into()));
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ConfigSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(back, snapshot);
        assert_eq!(back.restore(&store), set);
    }

    #[test]
    fn test_legacy_snapshot_restores_known_dimensions() {
        let store = store();
        let legacy = json!({
            "selectedOccupations": ["Designer"],
            "ageFilter": [40, 60],
            "nameFilter": "b",
            "sortConfig": {"key": 0, "direction": "descending"},
            "caseSensitive": false,
            "sqlSchema": "SELECT ...",
            "totalCount": 1,
            "timestamp": "2024-01-02T03:04:05.678Z"
        });
        let snapshot: ConfigSnapshot = serde_json::from_value(legacy).unwrap();
        assert!(snapshot.criteria.is_none());

        let set = snapshot.restore(&store);
        assert_eq!(set.selected("occupation"), Some(&["Designer".to_string()][..]));
        assert_eq!(set.range("age"), Some((40.0, 60.0)));
        assert_eq!(set.text("name"), Some("b"));
        assert_eq!(set.selected("pet").map(|s| s.len()), Some(2));
        assert_eq!(set.sort(), SortSpec::desc(0));
    }
}
