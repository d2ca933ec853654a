//! Predicate filtering for the query engine
//!
//! A record passes iff it satisfies every constrained dimension (AND
//! semantics). Dimensions equal to their unconstrained state are skipped
//! up front, so a select-all membership never excludes a record whose
//! value the universe lacks.

use crate::predicate::{Criterion, PredicateSet};
use crate::records::{CaseMode, FilterKind, Record, RecordStore};

/// One constrained dimension, resolved to its column
#[derive(Debug, Clone)]
enum ActiveFilter {
    Membership { column: usize, allowed: Vec<String> },
    Range { column: usize, min: f64, max: f64 },
    Search { column: usize, needle: String, fold_case: bool },
}

/// Evaluates a predicate set against records
#[derive(Debug, Clone)]
pub struct PredicateFilter {
    active: Vec<ActiveFilter>,
}

impl PredicateFilter {
    /// Resolves the constrained dimensions of `predicates` against `store`.
    pub fn compile(store: &RecordStore, predicates: &PredicateSet) -> Self {
        let mut active = Vec::new();

        for (column, descriptor) in store.layout().columns.iter().enumerate() {
            let Some(criterion) = predicates.criterion(&descriptor.key) else {
                continue;
            };
            if !criterion.fits(&descriptor.filter)
                || criterion.is_unconstrained(&descriptor.filter, store.universe(column))
            {
                continue;
            }

            let filter = match (criterion, &descriptor.filter) {
                (Criterion::Membership { allowed }, _) => ActiveFilter::Membership {
                    column,
                    allowed: allowed.clone(),
                },
                (Criterion::Range { min, max }, _) => ActiveFilter::Range {
                    column,
                    min: *min,
                    max: *max,
                },
                (Criterion::Text { query }, FilterKind::Search { case }) => {
                    let fold_case = match case {
                        CaseMode::FollowsFlag => !predicates.case_sensitive(),
                        CaseMode::AlwaysInsensitive => true,
                    };
                    let needle = if fold_case {
                        query.to_lowercase()
                    } else {
                        query.clone()
                    };
                    ActiveFilter::Search {
                        column,
                        needle,
                        fold_case,
                    }
                }
                (Criterion::Text { .. }, _) => continue,
            };
            active.push(filter);
        }

        Self { active }
    }

    /// Number of constrained dimensions
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Checks if a record matches all constrained dimensions
    pub fn matches(&self, record: &Record) -> bool {
        self.active.iter().all(|f| Self::matches_one(record, f))
    }

    /// Filters in input order
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    fn matches_one(record: &Record, filter: &ActiveFilter) -> bool {
        match filter {
            ActiveFilter::Membership { column, allowed } => {
                let value = record.cell(*column).display_key();
                allowed.iter().any(|a| *a == value)
            }
            ActiveFilter::Range { column, min, max } => match record.cell(*column).as_f64() {
                Some(v) => *min <= v && v <= *max,
                None => false,
            },
            ActiveFilter::Search {
                column,
                needle,
                fold_case,
            } => {
                let haystack = record.cell(*column).display_key();
                if *fold_case {
                    haystack.to_lowercase().contains(needle.as_str())
                } else {
                    haystack.contains(needle.as_str())
                }
            }
        }
    }
}
