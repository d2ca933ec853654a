//! Page windowing
//!
//! Pages are 1-based. A request past the end is clamped to the last valid
//! page, never answered with an empty slice.

use std::ops::Range;

use super::errors::{ExecutorError, ExecutorResult};

/// Requested page window; the size is always at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    index: usize,
    size: usize,
}

impl PageSpec {
    /// Validates the size; the index is clamped later against the row count.
    pub fn new(index: usize, size: usize) -> ExecutorResult<Self> {
        if size == 0 {
            return Err(ExecutorError::invalid_page_size(size));
        }
        Ok(Self { index, size })
    }

    /// Requested 1-based index, before clamping
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Same size, another page
    pub fn with_index(self, index: usize) -> Self {
        Self { index, ..self }
    }

    /// `max(1, ceil(total / size))`
    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.size).max(1)
    }

    /// Effective page index for `total` rows
    pub fn clamped_index(&self, total: usize) -> usize {
        self.index.clamp(1, self.total_pages(total))
    }

    /// Row range of the effective page
    pub fn window(&self, total: usize) -> Range<usize> {
        let start = (self.clamped_index(total) - 1) * self.size;
        let end = (start + self.size).min(total);
        start.min(total)..end
    }
}
