//! Schema projection
//!
//! Renders the predicate set as SQL-like text. Never executed; the exact
//! text is what snapshots store and what tests compare, so output depends
//! only on the layout and the predicate state.

use crate::predicate::{Criterion, PredicateSet, SortDirection};
use crate::records::{ColumnDescriptor, RecordStore};

/// Builds the schema string
pub struct SchemaProjector;

impl SchemaProjector {
    /// `SELECT <labels> FROM <table> [WHERE ..] [ORDER BY <label> <DIR>];`
    pub fn project(store: &RecordStore, predicates: &PredicateSet) -> String {
        let layout = store.layout();
        let mut parts = vec![
            "SELECT".to_string(),
            layout.labels().join(", "),
            "FROM".to_string(),
            layout.table_name.clone(),
        ];

        let clauses = Self::clauses(store, predicates);
        if !clauses.is_empty() {
            parts.push("WHERE".to_string());
            parts.push(clauses.join(" AND "));
        }

        let sort = predicates.sort();
        if let Some(column) = sort.key.and_then(|index| layout.column(index)) {
            let direction = match sort.direction {
                SortDirection::Ascending => "ASCENDING",
                SortDirection::Descending => "DESCENDING",
            };
            parts.push(format!("ORDER BY {} {}", column.label, direction));
        }

        format!("{};", parts.join(" "))
    }

    /// One clause per constrained dimension, in projection order
    pub fn clauses(store: &RecordStore, predicates: &PredicateSet) -> Vec<String> {
        let layout = store.layout();
        layout
            .projection_indices()
            .into_iter()
            .filter_map(|index| {
                let column = layout.column(index)?;
                let criterion = predicates.criterion(&column.key)?;
                if !criterion.fits(&column.filter)
                    || criterion.is_unconstrained(&column.filter, store.universe(index))
                {
                    return None;
                }
                Some(clause(column, criterion))
            })
            .collect()
    }
}

fn clause(column: &ColumnDescriptor, criterion: &Criterion) -> String {
    match criterion {
        Criterion::Membership { allowed } => {
            let values: Vec<String> = allowed.iter().map(|v| quote(v)).collect();
            format!("{} IN ({})", column.label, values.join(", "))
        }
        Criterion::Range { min, max } => format!(
            "{} BETWEEN {} AND {}",
            column.label,
            format_number(*min),
            format_number(*max)
        ),
        Criterion::Text { query } => {
            format!("{} LIKE {}", column.label, quote(&format!("%{}%", query)))
        }
    }
}

/// Single-quoted literal with embedded quotes doubled
pub(crate) fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Whole numbers print without a fractional part
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
