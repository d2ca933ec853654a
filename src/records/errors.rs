//! # Record Store Errors

use thiserror::Error;

/// Result type for record store operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Record store errors
///
/// Only the dataset boundary can fail. Short or long rows are not errors;
/// they degrade to missing cells.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RecordError {
    #[error("Failed to read dataset {0}: {1}")]
    DatasetRead(String, String),

    #[error("Invalid dataset JSON: {0}")]
    DatasetParse(String),

    #[error("Dataset has no headers")]
    NoHeaders,

    #[error("Layout declares {0} columns but dataset has {1} headers")]
    LayoutMismatch(usize, usize),

    #[error("Duplicate column key in layout: {0}")]
    DuplicateColumnKey(String),
}
