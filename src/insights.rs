//! Read-only aggregates over the record set
//!
//! The numbers behind the explorer's charts: facet counts for a selection,
//! an age-style histogram, the most frequent values of a dimension, and the
//! filtered-versus-total split.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::executor::DerivedView;
use crate::records::{FilterKind, RecordStore};

/// Upper bounds of the histogram buckets; values above the last fall in `51+`
const BUCKETS: [(&str, f64); 4] = [("0-20", 20.0), ("21-30", 30.0), ("31-40", 40.0), ("41-50", 50.0)];
const OPEN_BUCKET: &str = "51+";

/// Default length of a top-values list
pub const DEFAULT_TOP_N: usize = 5;

/// Records matching a candidate selection of one dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub selected: usize,
    pub matching: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterImpact {
    pub total: usize,
    pub filtered: usize,
}

/// Chart data for every dimension that has one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insights {
    /// Range dimensions
    pub histograms: BTreeMap<String, Vec<BucketCount>>,
    /// Membership dimensions
    pub top_values: BTreeMap<String, Vec<ValueCount>>,
    pub impact: FilterImpact,
}

impl Insights {
    pub fn collect(store: &RecordStore, view: &DerivedView) -> Self {
        let mut histograms = BTreeMap::new();
        let mut top = BTreeMap::new();

        for column in &store.layout().columns {
            match column.filter {
                FilterKind::Range(_) => {
                    if let Some(buckets) = histogram(store, &column.key) {
                        histograms.insert(column.key.clone(), buckets);
                    }
                }
                FilterKind::Membership => {
                    if let Some(values) = top_values(store, &column.key, DEFAULT_TOP_N) {
                        top.insert(column.key.clone(), values);
                    }
                }
                _ => {}
            }
        }

        Self {
            histograms,
            top_values: top,
            impact: filter_impact(view),
        }
    }
}

/// How many records fall in `selection` for dimension `key`
pub fn facet(store: &RecordStore, key: &str, selection: &[String]) -> Option<FacetCount> {
    let column = store.layout().index_of(key)?;
    let matching = store
        .records()
        .iter()
        .filter(|r| {
            let value = r.cell(column).display_key();
            selection.iter().any(|s| *s == value)
        })
        .count();

    Some(FacetCount {
        selected: selection.len(),
        matching,
        total: store.len(),
    })
}

/// Fixed-bucket histogram of a numeric dimension; non-numeric cells are skipped
pub fn histogram(store: &RecordStore, key: &str) -> Option<Vec<BucketCount>> {
    let column = store.layout().index_of(key)?;
    let mut counts = [0usize; BUCKETS.len() + 1];

    for value in store.records().iter().filter_map(|r| r.cell(column).as_f64()) {
        let slot = BUCKETS
            .iter()
            .position(|(_, upper)| value <= *upper)
            .unwrap_or(BUCKETS.len());
        counts[slot] += 1;
    }

    let labels = BUCKETS.iter().map(|(label, _)| *label).chain([OPEN_BUCKET]);
    Some(
        labels
            .zip(counts)
            .map(|(label, count)| BucketCount {
                label: label.to_string(),
                count,
            })
            .collect(),
    )
}

/// Most frequent values, count descending; ties keep first-appearance order
pub fn top_values(store: &RecordStore, key: &str, n: usize) -> Option<Vec<ValueCount>> {
    let column = store.layout().index_of(key)?;
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for record in store.records() {
        let value = record.cell(column).display_key();
        let count = counts.entry(value.clone()).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    let mut values: Vec<ValueCount> = order
        .into_iter()
        .map(|value| {
            let count = counts.get(&value).copied().unwrap_or(0);
            ValueCount { value, count }
        })
        .collect();
    values.sort_by(|a, b| b.count.cmp(&a.count));
    values.truncate(n);
    Some(values)
}

pub fn filter_impact(view: &DerivedView) -> FilterImpact {
    FilterImpact {
        total: view.total_records,
        filtered: view.total_filtered,
    }
}
