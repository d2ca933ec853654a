//! Filter summary readout
//!
//! Human-readable digest of the predicate set: the filtered total followed
//! by one line per filterable dimension in projection order.

use serde::Serialize;

use crate::predicate::{Criterion, PredicateSet};
use crate::records::RecordStore;

use super::schema::format_number;

/// One summarized dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub key: String,
    pub label: String,
    pub text: String,
}

/// Summary of the active filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuerySummary {
    pub total: usize,
    pub entries: Vec<SummaryEntry>,
}

impl QuerySummary {
    pub fn build(store: &RecordStore, predicates: &PredicateSet, total: usize) -> Self {
        let layout = store.layout();
        let entries = layout
            .projection_indices()
            .into_iter()
            .filter_map(|index| {
                let column = layout.column(index)?;
                let criterion = predicates.criterion(&column.key)?;
                let text = match criterion {
                    Criterion::Membership { allowed } => {
                        if criterion.is_unconstrained(&column.filter, store.universe(index)) {
                            "All".to_string()
                        } else if allowed.is_empty() {
                            "None".to_string()
                        } else {
                            allowed.join(", ")
                        }
                    }
                    Criterion::Range { min, max } => {
                        format!("Between {} and {}", format_number(*min), format_number(*max))
                    }
                    Criterion::Text { query } if query.is_empty() => "Any".to_string(),
                    Criterion::Text { query } => format!("Contains '{}'", query),
                };
                Some(SummaryEntry {
                    key: column.key.clone(),
                    label: column.label.clone(),
                    text,
                })
            })
            .collect();

        Self { total, entries }
    }

    /// Entry text for a dimension
    pub fn text(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.text.as_str())
    }
}
