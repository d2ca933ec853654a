//! Derived view types

use serde::Serialize;

use crate::records::{CellValue, RecordId};

/// A single row of the current page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRow {
    pub id: RecordId,
    /// Key annotations for this row are filed under
    pub owner: String,
    pub cells: Vec<CellValue>,
}

/// Filtered, sorted and paged output of the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedView {
    /// Rows of the effective page
    pub rows: Vec<ViewRow>,
    /// Effective 1-based page index after clamping
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    /// Records passing every active predicate
    pub total_filtered: usize,
    /// Records in the base dataset
    pub total_records: usize,
}

impl DerivedView {
    /// Returns true if the page holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows on the page
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Ids of the page rows in display order
    pub fn ids(&self) -> Vec<RecordId> {
        self.rows.iter().map(|r| r.id).collect()
    }
}
