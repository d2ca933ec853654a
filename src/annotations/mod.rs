//! Annotation Store subsystem
//!
//! Per-record notes and file attachments, keyed by owner and persisted
//! through a debounced write. Not part of the query pipeline.

mod attachment;
mod cache;
mod errors;
mod note;
mod store;

pub use attachment::{
    AllowedType, Attachment, AttachmentKind, AttachmentPolicy, AttachmentRejection,
    AttachmentUpload, RejectionReason, DEFAULT_MAX_ATTACHMENT_BYTES,
};
pub use cache::{CachedPayload, PayloadCache};
pub use errors::{AnnotationError, AnnotationResult};
pub use note::Annotation;
pub use store::{AnnotationStore, AppendOutcome, FlushReport, DEFAULT_FLUSH_WINDOW_MS};
