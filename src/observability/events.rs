//! Observable events for sheetscope
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded
    ConfigLoaded,
    /// Dataset read into the record store
    DatasetLoaded,
    /// Session ready to accept events
    Serving,
    /// Session shutting down
    Shutdown,

    // Query pipeline
    /// Derived view recomputed
    ViewComputed,
    /// Requested page was past the end and got clamped
    PageClamped,
    /// Collaborator event rejected
    EventRejected,

    // Configuration snapshots
    /// Snapshot appended
    SnapshotSaved,
    /// Snapshot applied to the live predicate set
    SnapshotLoaded,
    /// Snapshot removed
    SnapshotDeleted,
    /// All snapshots removed
    SnapshotsCleared,

    // Annotations
    /// Note appended
    AnnotationAppended,
    /// Attachment failed validation
    AttachmentRejected,
    /// Debounced flush scheduled or rescheduled
    FlushScheduled,
    /// Debounced flush written
    FlushComplete,

    // Durable storage
    /// Stored value unreadable, treated as empty
    StorageReadFailed,
    /// Stored value could not be written
    StorageWriteFailed,

    // Consent
    /// Consent choice stored
    ConsentRecorded,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DatasetLoaded => "DATASET_LOADED",
            Event::Serving => "SERVING",
            Event::Shutdown => "SHUTDOWN",

            Event::ViewComputed => "VIEW_COMPUTED",
            Event::PageClamped => "PAGE_CLAMPED",
            Event::EventRejected => "EVENT_REJECTED",

            Event::SnapshotSaved => "SNAPSHOT_SAVED",
            Event::SnapshotLoaded => "SNAPSHOT_LOADED",
            Event::SnapshotDeleted => "SNAPSHOT_DELETED",
            Event::SnapshotsCleared => "SNAPSHOTS_CLEARED",

            Event::AnnotationAppended => "ANNOTATION_APPENDED",
            Event::AttachmentRejected => "ATTACHMENT_REJECTED",
            Event::FlushScheduled => "FLUSH_SCHEDULED",
            Event::FlushComplete => "FLUSH_COMPLETE",

            Event::StorageReadFailed => "STORAGE_READ_FAILED",
            Event::StorageWriteFailed => "STORAGE_WRITE_FAILED",

            Event::ConsentRecorded => "CONSENT_RECORDED",
        }
    }

    /// Storage and rejection events are logged above INFO
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::StorageReadFailed
                | Event::StorageWriteFailed
                | Event::AttachmentRejected
                | Event::EventRejected
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
