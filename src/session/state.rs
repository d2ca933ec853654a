//! Application-state container
//!
//! One `Session` owns everything a single user works with: the record
//! store, the live predicate set, the page window, the memoizing engine
//! and the durable stores. Events are applied one at a time; each is
//! followed by a view recomputation and a poll of the debounced writes.

use std::rc::Rc;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use uuid::Uuid;

use crate::annotations::{
    Annotation, AnnotationStore, AppendOutcome, AttachmentPolicy, AttachmentUpload,
    DEFAULT_FLUSH_WINDOW_MS,
};
use crate::clock::Clock;
use crate::configs::{ConfigSnapshot, ConfigStore};
use crate::consent::{ConsentChoice, ConsentRecord, ConsentStore};
use crate::executor::{DerivedView, ExecutorResult, PageSpec, QueryEngine};
use crate::insights::Insights;
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::persistence::KeyValueStore;
use crate::predicate::PredicateSet;
use crate::projector::{QuerySummary, SchemaProjector};
use crate::records::RecordStore;

use super::events::{FilePayload, SessionEvent};
use super::notify::{Notification, NotificationLevel};

/// Default rows per page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Knobs fixed for the lifetime of a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub page_size: usize,
    pub debounce: Duration,
    pub policy: AttachmentPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce: Duration::milliseconds(DEFAULT_FLUSH_WINDOW_MS),
            policy: AttachmentPolicy::default(),
        }
    }
}

/// Answer to one event
#[derive(Debug, Clone, Serialize)]
pub struct SessionReply {
    pub event: &'static str,
    pub view: DerivedView,
    pub schema: String,
    /// Whether saving is currently allowed
    pub dirty: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshots: Option<Vec<ConfigSnapshot>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Annotation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appended: Option<AppendOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent: Option<ConsentRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<QuerySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<Insights>,
}

impl SessionReply {
    /// True if any notification is an error
    pub fn has_errors(&self) -> bool {
        self.notifications
            .iter()
            .any(|n| n.level == NotificationLevel::Error)
    }
}

/// Payload gathered while applying one event
#[derive(Default)]
struct Outcome {
    notifications: Vec<Notification>,
    snapshots: Option<Vec<ConfigSnapshot>>,
    saved_id: Option<Uuid>,
    annotations: Option<Vec<Annotation>>,
    appended: Option<AppendOutcome>,
    consent: Option<ConsentRecord>,
    summary: bool,
    insights: bool,
}

impl Outcome {
    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}

/// Single-user explorer session
pub struct Session {
    store: RecordStore,
    predicates: PredicateSet,
    page: PageSpec,
    engine: QueryEngine,
    view: DerivedView,
    configs: ConfigStore,
    annotations: AnnotationStore,
    consent: ConsentStore,
    clock: Rc<dyn Clock>,
    dirty: bool,
}

impl Session {
    /// Opens the durable stores on `backend` and computes the first page.
    pub fn open(
        store: RecordStore,
        backend: Arc<dyn KeyValueStore>,
        clock: Rc<dyn Clock>,
        options: SessionOptions,
    ) -> ExecutorResult<Self> {
        let page = PageSpec::new(1, options.page_size)?;
        let predicates = PredicateSet::for_store(&store);
        let mut engine = QueryEngine::new();
        let view = engine.compute_page(&store, &predicates, page);

        let configs = ConfigStore::open(Arc::clone(&backend));
        let annotations = AnnotationStore::open(Arc::clone(&backend), options.policy, options.debounce);
        let consent = ConsentStore::open(backend);

        log_event(Event::Serving);

        Ok(Self {
            store,
            predicates,
            page,
            engine,
            view,
            configs,
            annotations,
            consent,
            clock,
            dirty: true,
        })
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn predicates(&self) -> &PredicateSet {
        &self.predicates
    }

    pub fn view(&self) -> &DerivedView {
        &self.view
    }

    pub fn schema(&self) -> String {
        SchemaProjector::project(&self.store, &self.predicates)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn page_size(&self) -> usize {
        self.page.size()
    }

    pub fn snapshots(&self) -> &[ConfigSnapshot] {
        self.configs.list()
    }

    pub fn annotations(&self, owner: &str) -> &[Annotation] {
        self.annotations.list(owner)
    }

    pub fn consent(&self) -> &ConsentStore {
        &self.consent
    }

    pub fn has_pending_flush(&self) -> bool {
        self.annotations.has_pending_flush()
    }

    /// Applies one event and answers with the recomputed view.
    pub fn handle(&mut self, event: SessionEvent) -> SessionReply {
        let name = event.name();

        let before = self.predicates.clone();
        let mut outcome = Outcome::default();

        if let Some(dimension) = event.dimension() {
            if self.store.layout().index_of(dimension).is_none() {
                reject(
                    &mut outcome,
                    name,
                    "unknown_dimension",
                    format!("Unknown dimension '{}'", dimension),
                );
                return self.finish(name, before, outcome);
            }
        }

        self.apply(event, &mut outcome);
        self.finish(name, before, outcome)
    }

    fn apply(&mut self, event: SessionEvent, outcome: &mut Outcome) {
        let store = &self.store;
        let predicates = &mut self.predicates;
        match event {
            SessionEvent::ToggleValue { dimension, value } => {
                predicates.toggle_membership(store, &dimension, &value);
            }
            SessionEvent::ToggleAll { dimension } => {
                predicates.toggle_all(store, &dimension);
            }
            SessionEvent::SelectAll { dimension } => {
                predicates.select_all(store, &dimension);
            }
            SessionEvent::SelectNone { dimension } => {
                predicates.select_none(store, &dimension);
            }
            SessionEvent::SetRange { dimension, min, max } => {
                predicates.set_range(store, &dimension, min, max);
            }
            SessionEvent::SetRangeMin { dimension, value } => {
                predicates.set_range_min(store, &dimension, value);
            }
            SessionEvent::SetRangeMax { dimension, value } => {
                predicates.set_range_max(store, &dimension, value);
            }
            SessionEvent::SetText { dimension, text } => {
                predicates.set_text(store, &dimension, &text);
            }
            SessionEvent::SetCaseSensitive { enabled } => {
                predicates.set_case_sensitive(enabled);
            }
            SessionEvent::Reset => {
                predicates.reset(store);
                self.page = self.page.with_index(1);
            }
            SessionEvent::SortRequested { column } => {
                if column >= store.layout().len() {
                    reject(
                        outcome,
                        "sort_requested",
                        "unknown_column",
                        format!("No column at index {}", column),
                    );
                } else {
                    predicates.set_sort(store, column);
                }
            }
            SessionEvent::PageRequested { index } => {
                self.page = self.page.with_index(index);
            }
            SessionEvent::PageSizeChanged { size } => match PageSpec::new(1, size) {
                Ok(page) => self.page = page,
                Err(err) => {
                    let code = err.code().code();
                    reject(outcome, "page_size_changed", code, err.to_string());
                }
            },
            SessionEvent::SnapshotSaveRequested { label } => self.save_snapshot(label, outcome),
            // Dirty only when the loaded snapshot differs from the current
            // predicates; loading an identical one keeps a clean session clean.
            SessionEvent::SnapshotLoadRequested { id } => {
                match self.configs.load(id, &self.store) {
                    Ok(restored) => {
                        self.predicates = restored;
                        outcome.notify(Notification::success("snapshot_loaded", "Configuration loaded"));
                    }
                    Err(err) => outcome.notify(Notification::error(err.code(), err.to_string())),
                }
            }
            SessionEvent::SnapshotDeleteRequested { id } => match self.configs.delete(id) {
                Ok(()) => {
                    outcome.notify(Notification::success("snapshot_deleted", "Configuration deleted"))
                }
                Err(err) => outcome.notify(Notification::error(err.code(), err.to_string())),
            },
            SessionEvent::SnapshotsClearRequested => match self.configs.clear_all() {
                Ok(()) => outcome.notify(Notification::success(
                    "snapshots_cleared",
                    "All configurations cleared",
                )),
                Err(err) => outcome.notify(Notification::error(err.code(), err.to_string())),
            },
            SessionEvent::SnapshotsListRequested => {
                outcome.snapshots = Some(self.configs.list().to_vec());
            }
            SessionEvent::AnnotationAppendRequested { owner, text, files } => {
                self.append_annotation(&owner, &text, &files, outcome)
            }
            SessionEvent::AnnotationsListRequested { owner } => {
                outcome.annotations = Some(self.annotations.list(&owner).to_vec());
            }
            SessionEvent::ConsentRecorded { choice } => self.record_consent(choice, outcome),
            SessionEvent::ViewRequested | SessionEvent::Tick => {}
            SessionEvent::SummaryRequested => outcome.summary = true,
            SessionEvent::InsightsRequested => outcome.insights = true,
        }
    }

    fn save_snapshot(&mut self, label: Option<String>, outcome: &mut Outcome) {
        if !self.dirty {
            outcome.notify(Notification::info(
                "nothing_to_save",
                "Current configuration is already saved",
            ));
            return;
        }

        let snapshot = ConfigSnapshot::capture(
            &self.predicates,
            self.schema(),
            self.view.total_filtered,
            self.clock.now(),
            label,
        );
        let id = snapshot.id;
        // The mirror keeps the snapshot even when the write fails.
        self.dirty = false;
        outcome.saved_id = Some(id);
        match self.configs.save(snapshot) {
            Ok(_) => outcome.notify(Notification::success(
                "snapshot_saved",
                "Configuration saved successfully",
            )),
            Err(err) => outcome.notify(Notification::error(err.code(), err.to_string())),
        }
    }

    fn append_annotation(&mut self, owner: &str, text: &str, files: &[FilePayload], outcome: &mut Outcome) {
        if self.store.resolve_owner(owner).is_none() {
            let message = format!("No record with owner key {}", owner);
            reject(outcome, "annotation_append_requested", "unknown_owner", message);
            return;
        }

        let mut uploads: Vec<AttachmentUpload> = Vec::with_capacity(files.len());
        for file in files {
            match file.decode() {
                Some(upload) => uploads.push(upload),
                None => outcome.notify(Notification::error(
                    "invalid_payload",
                    format!("File {} could not be decoded", file.name),
                )),
            }
        }

        match self.annotations.append(owner, text, &uploads, self.clock.now()) {
            Ok(appended) => {
                for rejection in &appended.rejections {
                    outcome.notify(Notification::error(rejection.reason.code(), rejection.message.clone()));
                }
                outcome.notify(Notification::success("annotation_added", "Note added"));
                outcome.annotations = Some(self.annotations.list(owner).to_vec());
                outcome.appended = Some(appended);
            }
            Err(err) => {
                if let crate::annotations::AnnotationError::EmptyNote(rejections) = &err {
                    for rejection in rejections {
                        outcome.notify(Notification::error(
                            rejection.reason.code(),
                            rejection.message.clone(),
                        ));
                    }
                }
                outcome.notify(Notification::error(err.code(), err.to_string()));
            }
        }
    }

    fn record_consent(&mut self, choice: ConsentChoice, outcome: &mut Outcome) {
        match self.consent.record(choice, self.clock.now()) {
            Ok(record) => outcome.consent = Some(record.clone()),
            Err(err) => {
                outcome.consent = self.consent.current().cloned();
                outcome.notify(Notification::error(err.code(), err.to_string()));
            }
        }
    }

    fn finish(&mut self, name: &'static str, before: PredicateSet, mut outcome: Outcome) -> SessionReply {
        if self.predicates != before {
            self.dirty = true;
        }

        self.view = self.engine.compute_page(&self.store, &self.predicates, self.page);
        self.page = self.page.with_index(self.view.page_index);

        match self.annotations.poll(self.clock.now()) {
            Ok(_) => {}
            Err(err) => outcome.notify(Notification::error(err.code(), err.to_string())),
        }

        SessionReply {
            event: name,
            view: self.view.clone(),
            schema: self.schema(),
            dirty: self.dirty,
            notifications: outcome.notifications,
            snapshots: outcome.snapshots,
            saved_id: outcome.saved_id,
            annotations: outcome.annotations,
            appended: outcome.appended,
            consent: outcome.consent,
            summary: outcome
                .summary
                .then(|| QuerySummary::build(&self.store, &self.predicates, self.view.total_filtered)),
            insights: outcome
                .insights
                .then(|| Insights::collect(&self.store, &self.view)),
        }
    }

    /// Writes any pending debounced annotation flush.
    pub fn shutdown(&mut self) -> Vec<Notification> {
        let mut notifications = Vec::new();
        if let Err(err) = self.annotations.flush_now() {
            notifications.push(Notification::error(err.code(), err.to_string()));
        }
        log_event(Event::Shutdown);
        notifications
    }
}

fn reject(outcome: &mut Outcome, event: &str, code: &str, message: String) {
    log_event_with_fields(
        Event::EventRejected,
        &[("code", code), ("event", event), ("message", message.as_str())],
    );
    outcome.notify(Notification::error(code, message));
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("records", &self.store.len())
            .field("page", &self.page)
            .field("dirty", &self.dirty)
            .finish()
    }
}
