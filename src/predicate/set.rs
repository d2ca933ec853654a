//! Predicate Set: the working filter state
//!
//! Criteria are keyed by column key and kept in a `BTreeMap`, so equality
//! and serialization are deterministic. Every operation takes the record
//! store it applies to, because universes and range bounds live there.
//!
//! Mutators return `true` when state changed. Unknown keys, wrong filter
//! kinds and values outside the universe are no-ops returning `false`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::records::{FilterKind, RangeBounds, RecordStore};

use super::criterion::Criterion;
use super::sort::SortSpec;

/// Complete filter configuration across all dimensions plus sort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateSet {
    criteria: BTreeMap<String, Criterion>,
    case_sensitive: bool,
    sort: SortSpec,
}

impl PredicateSet {
    /// The reset state for a store: every universe selected, full ranges,
    /// empty text, case-insensitive, unsorted.
    pub fn for_store(store: &RecordStore) -> Self {
        let criteria = store
            .layout()
            .columns
            .iter()
            .enumerate()
            .filter_map(|(index, column)| {
                Criterion::unconstrained(&column.filter, store.universe(index))
                    .map(|criterion| (column.key.clone(), criterion))
            })
            .collect();

        Self {
            criteria,
            case_sensitive: false,
            sort: SortSpec::unsorted(),
        }
    }

    /// Assembles a set from stored parts, repairing it against `store`.
    ///
    /// Unknown keys and criteria of the wrong shape are dropped, missing
    /// dimensions get their reset value, ranges are clamped and a sort key
    /// that doesn't name a sortable column is cleared.
    pub fn from_parts(
        store: &RecordStore,
        criteria: BTreeMap<String, Criterion>,
        case_sensitive: bool,
        sort: SortSpec,
    ) -> Self {
        let mut set = Self::for_store(store);

        for (key, criterion) in criteria {
            let Some(column) = store.layout().descriptor(&key) else {
                continue;
            };
            if !criterion.fits(&column.filter) {
                continue;
            }
            let criterion = match (criterion, &column.filter) {
                (Criterion::Range { min, max }, FilterKind::Range(bounds)) => {
                    let (min, max) = clamp_pair(bounds, min, max);
                    Criterion::Range { min, max }
                }
                (other, _) => other,
            };
            set.criteria.insert(key, criterion);
        }

        set.case_sensitive = case_sensitive;
        set.sort = if sort_allowed(store, sort.key) {
            sort
        } else {
            SortSpec::unsorted()
        };
        set
    }

    pub fn criteria(&self) -> &BTreeMap<String, Criterion> {
        &self.criteria
    }

    pub fn criterion(&self, key: &str) -> Option<&Criterion> {
        self.criteria.get(key)
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    /// Selected values of a membership dimension
    pub fn selected(&self, key: &str) -> Option<&[String]> {
        match self.criteria.get(key)? {
            Criterion::Membership { allowed } => Some(allowed),
            _ => None,
        }
    }

    /// `(min, max)` of a range dimension
    pub fn range(&self, key: &str) -> Option<(f64, f64)> {
        match self.criteria.get(key)? {
            Criterion::Range { min, max } => Some((*min, *max)),
            _ => None,
        }
    }

    /// Query of a search dimension
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.criteria.get(key)? {
            Criterion::Text { query } => Some(query),
            _ => None,
        }
    }

    /// Toggles one value of a membership dimension.
    ///
    /// When the whole universe is selected, the click narrows the selection
    /// to exactly that value instead of removing it.
    pub fn toggle_membership(&mut self, store: &RecordStore, key: &str, value: &str) -> bool {
        let Some(universe) = membership_universe(store, key) else {
            return false;
        };
        if !universe.iter().any(|v| v == value) {
            return false;
        }
        let Some(Criterion::Membership { allowed }) = self.criteria.get_mut(key) else {
            return false;
        };

        if super::criterion::same_set(allowed, universe) {
            *allowed = vec![value.to_string()];
        } else if let Some(position) = allowed.iter().position(|v| v == value) {
            allowed.remove(position);
        } else {
            allowed.push(value.to_string());
        }
        true
    }

    /// Select-all button: all selected becomes none, anything else becomes all.
    pub fn toggle_all(&mut self, store: &RecordStore, key: &str) -> bool {
        let Some(universe) = membership_universe(store, key) else {
            return false;
        };
        let Some(Criterion::Membership { allowed }) = self.criteria.get_mut(key) else {
            return false;
        };

        if super::criterion::same_set(allowed, universe) {
            allowed.clear();
        } else {
            *allowed = universe.to_vec();
        }
        true
    }

    pub fn select_all(&mut self, store: &RecordStore, key: &str) -> bool {
        let Some(universe) = membership_universe(store, key) else {
            return false;
        };
        self.replace_membership(key, universe.to_vec())
    }

    pub fn select_none(&mut self, store: &RecordStore, key: &str) -> bool {
        if membership_universe(store, key).is_none() {
            return false;
        }
        self.replace_membership(key, Vec::new())
    }

    fn replace_membership(&mut self, key: &str, values: Vec<String>) -> bool {
        match self.criteria.get_mut(key) {
            Some(Criterion::Membership { allowed }) => {
                let changed = *allowed != values;
                *allowed = values;
                changed
            }
            _ => false,
        }
    }

    /// Sets both bounds. Each is clamped to the column's bounds; a minimum
    /// above the maximum pushes the maximum up to it.
    pub fn set_range(&mut self, store: &RecordStore, key: &str, min: f64, max: f64) -> bool {
        let Some(bounds) = range_bounds(store, key) else {
            return false;
        };
        let (min, max) = clamp_pair(&bounds, min, max);
        self.write_range(key, min, max)
    }

    /// Moves the lower bound; the upper bound follows if it would cross.
    pub fn set_range_min(&mut self, store: &RecordStore, key: &str, value: f64) -> bool {
        let (Some(bounds), Some((_, hi))) = (range_bounds(store, key), self.range(key)) else {
            return false;
        };
        let value = bounds.clamp(sanitize(value));
        self.write_range(key, value, value.max(hi))
    }

    /// Moves the upper bound; the lower bound follows if it would cross.
    pub fn set_range_max(&mut self, store: &RecordStore, key: &str, value: f64) -> bool {
        let (Some(bounds), Some((lo, _))) = (range_bounds(store, key), self.range(key)) else {
            return false;
        };
        let value = bounds.clamp(sanitize(value));
        self.write_range(key, lo.min(value), value)
    }

    fn write_range(&mut self, key: &str, min: f64, max: f64) -> bool {
        match self.criteria.get_mut(key) {
            Some(Criterion::Range { min: lo, max: hi }) => {
                let changed = *lo != min || *hi != max;
                *lo = min;
                *hi = max;
                changed
            }
            _ => false,
        }
    }

    pub fn set_text(&mut self, store: &RecordStore, key: &str, text: &str) -> bool {
        let is_search = store
            .layout()
            .descriptor(key)
            .map(|c| matches!(c.filter, FilterKind::Search { .. }))
            .unwrap_or(false);
        if !is_search {
            return false;
        }
        match self.criteria.get_mut(key) {
            Some(Criterion::Text { query }) => {
                let changed = query != text;
                *query = text.to_string();
                changed
            }
            _ => false,
        }
    }

    pub fn set_case_sensitive(&mut self, enabled: bool) -> bool {
        let changed = self.case_sensitive != enabled;
        self.case_sensitive = enabled;
        changed
    }

    /// Header click on `column`
    pub fn set_sort(&mut self, store: &RecordStore, column: usize) -> bool {
        if !sort_allowed(store, Some(column)) {
            return false;
        }
        self.sort = self.sort.requested(column);
        true
    }

    pub fn clear_sort(&mut self) -> bool {
        let changed = self.sort.is_sorted();
        self.sort = SortSpec::unsorted();
        changed
    }

    /// Restores the reset state for `store`
    pub fn reset(&mut self, store: &RecordStore) {
        *self = Self::for_store(store);
    }
}

fn membership_universe<'a>(store: &'a RecordStore, key: &str) -> Option<&'a [String]> {
    let index = store.layout().index_of(key)?;
    match store.layout().column(index)?.filter {
        FilterKind::Membership => Some(store.universe(index)),
        _ => None,
    }
}

fn range_bounds(store: &RecordStore, key: &str) -> Option<RangeBounds> {
    match store.layout().descriptor(key)?.filter {
        FilterKind::Range(bounds) => Some(bounds),
        _ => None,
    }
}

fn sort_allowed(store: &RecordStore, key: Option<usize>) -> bool {
    match key {
        None => true,
        Some(index) => store
            .layout()
            .column(index)
            .map(|c| c.sortable)
            .unwrap_or(false),
    }
}

/// Non-numeric input reads as 0, as the source's `Number(v) || 0` did
fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn clamp_pair(bounds: &RangeBounds, min: f64, max: f64) -> (f64, f64) {
    let min = bounds.clamp(sanitize(min));
    let max = bounds.clamp(sanitize(max));
    (min, max.max(min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::SortDirection;
    use crate::records::{CaseMode, CellValue, ColumnDescriptor, ColumnLayout};

    fn store() -> RecordStore {
        let layout = ColumnLayout::new(
            "t",
            vec![
                ColumnDescriptor::search("name", "Name", CaseMode::FollowsFlag),
                ColumnDescriptor::range("age", "Age", 0.0, 100.0),
                ColumnDescriptor::membership("letter", "Letter"),
            ],
        );
        let rows = vec![
            vec![CellValue::from("x"), CellValue::Int(1), CellValue::from("A")],
            vec![CellValue::from("y"), CellValue::Int(2), CellValue::from("B")],
            vec![CellValue::from("z"), CellValue::Int(3), CellValue::from("C")],
        ];
        RecordStore::new(
            vec!["Name".into(), "Age".into(), "Letter".into()],
            rows,
            layout,
        )
        .unwrap()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_for_store_defaults() {
        let store = store();
        let set = PredicateSet::for_store(&store);
        assert_eq!(set.selected("letter"), Some(&strings(&["A", "B", "C"])[..]));
        assert_eq!(set.range("age"), Some((0.0, 100.0)));
        assert_eq!(set.text("name"), Some(""));
        assert!(!set.case_sensitive());
        assert_eq!(set.sort(), SortSpec::unsorted());
    }

    #[test]
    fn test_toggle_collapses_full_selection() {
        let store = store();
        let mut set = PredicateSet::for_store(&store);

        assert!(set.toggle_membership(&store, "letter", "B"));
        assert_eq!(set.selected("letter"), Some(&strings(&["B"])[..]));
    }

    #[test]
    fn test_toggle_adds_and_removes_when_partial() {
        let store = store();
        let mut set = PredicateSet::for_store(&store);
        set.toggle_membership(&store, "letter", "B");

        set.toggle_membership(&store, "letter", "A");
        assert_eq!(set.selected("letter"), Some(&strings(&["B", "A"])[..]));

        set.toggle_membership(&store, "letter", "B");
        assert_eq!(set.selected("letter"), Some(&strings(&["A"])[..]));

        set.toggle_membership(&store, "letter", "A");
        assert_eq!(set.selected("letter"), Some(&[][..]));
    }

    #[test]
    fn test_toggle_outside_universe_is_noop() {
        let store = store();
        let mut set = PredicateSet::for_store(&store);
        let before = set.clone();

        assert!(!set.toggle_membership(&store, "letter", "Z"));
        assert!(!set.toggle_membership(&store, "nope", "A"));
        assert!(!set.toggle_membership(&store, "age", "1"));
        assert_eq!(set, before);
    }

    #[test]
    fn test_toggle_all() {
        let store = store();
        let mut set = PredicateSet::for_store(&store);

        set.toggle_all(&store, "letter");
        assert_eq!(set.selected("letter"), Some(&[][..]));

        set.toggle_all(&store, "letter");
        assert_eq!(set.selected("letter"), Some(&strings(&["A", "B", "C"])[..]));
    }

    #[test]
    fn test_select_all_and_none() {
        let store = store();
        let mut set = PredicateSet::for_store(&store);

        assert!(set.select_none(&store, "letter"));
        assert!(!set.select_none(&store, "letter"));
        assert!(set.select_all(&store, "letter"));
        assert_eq!(set.selected("letter").map(|s| s.len()), Some(3));
    }

    #[test]
    fn test_set_range_clamps_and_pushes() {
        let store = store();
        let mut set = PredicateSet::for_store(&store);

        set.set_range(&store, "age", -10.0, 250.0);
        assert_eq!(set.range("age"), Some((0.0, 100.0)));

        set.set_range(&store, "age", 60.0, 40.0);
        assert_eq!(set.range("age"), Some((60.0, 60.0)));
    }

    #[test]
    fn test_range_min_max_push_other_bound() {
        let store = store();
        let mut set = PredicateSet::for_store(&store);
        set.set_range(&store, "age", 20.0, 40.0);

        set.set_range_min(&store, "age", 55.0);
        assert_eq!(set.range("age"), Some((55.0, 55.0)));

        set.set_range_max(&store, "age", 10.0);
        assert_eq!(set.range("age"), Some((10.0, 10.0)));

        set.set_range_max(&store, "age", 300.0);
        assert_eq!(set.range("age"), Some((10.0, 100.0)));

        set.set_range_min(&store, "age", f64::NAN);
        assert_eq!(set.range("age"), Some((0.0, 100.0)));
    }

    #[test]
    fn test_set_text_only_on_search_dimensions() {
        let store = store();
        let mut set = PredicateSet::for_store(&store);
        assert!(set.set_text(&store, "name", "al"));
        assert!(!set.set_text(&store, "name", "al"));
        assert!(!set.set_text(&store, "letter", "al"));
        assert_eq!(set.text("name"), Some("al"));
    }

    #[test]
    fn test_set_sort_header_clicks() {
        let store = store();
        let mut set = PredicateSet::for_store(&store);

        assert!(set.set_sort(&store, 1));
        assert_eq!(set.sort().direction, SortDirection::Ascending);
        set.set_sort(&store, 1);
        assert_eq!(set.sort().direction, SortDirection::Descending);
        set.set_sort(&store, 0);
        assert_eq!(set.sort(), SortSpec::asc(0));

        assert!(!set.set_sort(&store, 9));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let store = store();
        let mut set = PredicateSet::for_store(&store);
        set.toggle_membership(&store, "letter", "A");
        set.set_text(&store, "name", "q");
        set.set_case_sensitive(true);
        set.set_sort(&store, 1);

        set.reset(&store);
        let once = set.clone();
        set.reset(&store);
        assert_eq!(set, once);
        assert_eq!(once, PredicateSet::for_store(&store));
    }

    #[test]
    fn test_from_parts_repairs_input() {
        let store = store();
        let mut criteria = BTreeMap::new();
        criteria.insert("age".to_string(), Criterion::Range { min: -5.0, max: 500.0 });
        criteria.insert(
            "letter".to_string(),
            Criterion::Text {
                query: "wrong shape".to_string(),
            },
        );
        criteria.insert(
            "ghost".to_string(),
            Criterion::Text {
                query: "x".to_string(),
            },
        );

        let set = PredicateSet::from_parts(&store, criteria, true, SortSpec::asc(42));

        assert_eq!(set.range("age"), Some((0.0, 100.0)));
        assert_eq!(set.selected("letter").map(|s| s.len()), Some(3));
        assert!(set.criterion("ghost").is_none());
        assert!(set.case_sensitive());
        assert_eq!(set.sort(), SortSpec::unsorted());
    }
}
