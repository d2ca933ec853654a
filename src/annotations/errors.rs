//! # Annotation Errors

use thiserror::Error;

use crate::persistence::PersistenceError;

use super::attachment::AttachmentRejection;

/// Result type for annotation operations
pub type AnnotationResult<T> = Result<T, AnnotationError>;

/// Annotation store errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnnotationError {
    /// Blank text and no accepted file; carries any file rejections
    #[error("Please add a note or attach files")]
    EmptyNote(Vec<AttachmentRejection>),

    #[error("No record with owner key {0}")]
    UnknownOwner(String),

    #[error("Annotations not persisted: {0}")]
    Storage(#[from] PersistenceError),
}

impl AnnotationError {
    pub fn code(&self) -> &'static str {
        match self {
            AnnotationError::EmptyNote(_) => "empty_note",
            AnnotationError::UnknownOwner(_) => "unknown_owner",
            AnnotationError::Storage(e) => e.code(),
        }
    }
}
