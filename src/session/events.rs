//! Collaborator events
//!
//! JSON objects tagged by `"type"`, one per user action the presentation
//! layer forwards into the core.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::annotations::AttachmentUpload;
use crate::consent::ConsentChoice;

/// A file carried inline in an append request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    pub name: String,
    pub mime_type: String,
    pub data_base64: String,
}

impl FilePayload {
    /// Decodes the payload; `None` if the base64 is malformed
    pub fn decode(&self) -> Option<AttachmentUpload> {
        let data = STANDARD.decode(self.data_base64.trim()).ok()?;
        Some(AttachmentUpload::new(self.name.clone(), self.mime_type.clone(), data))
    }
}

/// Events accepted by a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    ToggleValue { dimension: String, value: String },
    ToggleAll { dimension: String },
    SelectAll { dimension: String },
    SelectNone { dimension: String },
    SetRange { dimension: String, min: f64, max: f64 },
    SetRangeMin { dimension: String, value: f64 },
    SetRangeMax { dimension: String, value: f64 },
    SetText { dimension: String, text: String },
    SetCaseSensitive { enabled: bool },
    Reset,
    SortRequested { column: usize },
    PageRequested { index: usize },
    PageSizeChanged { size: usize },
    SnapshotSaveRequested {
        #[serde(default)]
        label: Option<String>,
    },
    SnapshotLoadRequested { id: Uuid },
    SnapshotDeleteRequested { id: Uuid },
    SnapshotsClearRequested,
    SnapshotsListRequested,
    AnnotationAppendRequested {
        owner: String,
        #[serde(default)]
        text: String,
        #[serde(default)]
        files: Vec<FilePayload>,
    },
    AnnotationsListRequested { owner: String },
    ConsentRecorded { choice: ConsentChoice },
    ViewRequested,
    SummaryRequested,
    InsightsRequested,
    Tick,
}

impl SessionEvent {
    /// The `type` tag
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::ToggleValue { .. } => "toggle_value",
            SessionEvent::ToggleAll { .. } => "toggle_all",
            SessionEvent::SelectAll { .. } => "select_all",
            SessionEvent::SelectNone { .. } => "select_none",
            SessionEvent::SetRange { .. } => "set_range",
            SessionEvent::SetRangeMin { .. } => "set_range_min",
            SessionEvent::SetRangeMax { .. } => "set_range_max",
            SessionEvent::SetText { .. } => "set_text",
            SessionEvent::SetCaseSensitive { .. } => "set_case_sensitive",
            SessionEvent::Reset => "reset",
            SessionEvent::SortRequested { .. } => "sort_requested",
            SessionEvent::PageRequested { .. } => "page_requested",
            SessionEvent::PageSizeChanged { .. } => "page_size_changed",
            SessionEvent::SnapshotSaveRequested { .. } => "snapshot_save_requested",
            SessionEvent::SnapshotLoadRequested { .. } => "snapshot_load_requested",
            SessionEvent::SnapshotDeleteRequested { .. } => "snapshot_delete_requested",
            SessionEvent::SnapshotsClearRequested => "snapshots_clear_requested",
            SessionEvent::SnapshotsListRequested => "snapshots_list_requested",
            SessionEvent::AnnotationAppendRequested { .. } => "annotation_append_requested",
            SessionEvent::AnnotationsListRequested { .. } => "annotations_list_requested",
            SessionEvent::ConsentRecorded { .. } => "consent_recorded",
            SessionEvent::ViewRequested => "view_requested",
            SessionEvent::SummaryRequested => "summary_requested",
            SessionEvent::InsightsRequested => "insights_requested",
            SessionEvent::Tick => "tick",
        }
    }

    /// Dimension key the event targets, if any
    pub fn dimension(&self) -> Option<&str> {
        match self {
            SessionEvent::ToggleValue { dimension, .. }
            | SessionEvent::ToggleAll { dimension }
            | SessionEvent::SelectAll { dimension }
            | SessionEvent::SelectNone { dimension }
            | SessionEvent::SetRange { dimension, .. }
            | SessionEvent::SetRangeMin { dimension, .. }
            | SessionEvent::SetRangeMax { dimension, .. }
            | SessionEvent::SetText { dimension, .. } => Some(dimension),
            _ => None,
        }
    }
}
