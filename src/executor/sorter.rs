//! Result sorting for the query engine

use crate::predicate::{SortDirection, SortSpec};
use crate::records::Record;

/// Sorts filtered records
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts records according to the sort specification.
    ///
    /// Stable: records with equal keys keep their filtered order in both
    /// directions. An unsorted spec leaves input order untouched.
    pub fn sort(records: &mut [&Record], spec: &SortSpec) {
        let Some(column) = spec.key else {
            return;
        };

        records.sort_by(|a, b| {
            let ordering = a.cell(column).natural_cmp(b.cell(column));
            match spec.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
}
