//! Annotation Store
//!
//! Notes are append-only per owner and listed chronologically. Every
//! append schedules one debounced flush that writes the note map and the
//! payload cache together; appends inside the window push the flush back
//! and are coalesced into it. A flush always writes the full current
//! state, so a superseded schedule never loses data.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::observability::{log_event_with_fields, Event};
use crate::persistence::{keys, read_json, write_json, KeyValueStore};
use crate::scheduler::Debouncer;

use super::attachment::{Attachment, AttachmentPolicy, AttachmentRejection, AttachmentUpload};
use super::cache::PayloadCache;
use super::errors::{AnnotationError, AnnotationResult};
use super::note::Annotation;

/// Default debounce window for annotation writes
pub const DEFAULT_FLUSH_WINDOW_MS: i64 = 1000;

const FLUSH_KEY: &str = "annotations";

/// Result of an accepted append
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppendOutcome {
    pub annotation: Annotation,
    /// Files refused while the note itself was kept
    pub rejections: Vec<AttachmentRejection>,
    /// When the pending write is due
    #[serde(with = "crate::clock::iso8601")]
    pub flush_due: DateTime<Utc>,
}

/// What a completed flush wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    /// Appends folded into this write
    pub coalesced: u32,
    pub owners: usize,
}

/// Per-record notes with attachment payloads
#[derive(Debug)]
pub struct AnnotationStore {
    backend: Arc<dyn KeyValueStore>,
    policy: AttachmentPolicy,
    notes: BTreeMap<String, Vec<Annotation>>,
    cache: PayloadCache,
    issued: HashSet<String>,
    debouncer: Debouncer<()>,
}

impl AnnotationStore {
    /// Loads notes and payloads from `backend`; unreadable values start empty.
    pub fn open(backend: Arc<dyn KeyValueStore>, policy: AttachmentPolicy, window: Duration) -> Self {
        let notes: BTreeMap<String, Vec<Annotation>> =
            read_json(backend.as_ref(), keys::USER_NOTES).unwrap_or_default();
        let cache: PayloadCache = read_json(backend.as_ref(), keys::FILE_CACHE).unwrap_or_default();

        let issued = notes
            .values()
            .flatten()
            .flat_map(|note| note.attachments.iter().map(|a| a.reference.clone()))
            .collect();

        Self {
            backend,
            policy,
            notes,
            cache,
            issued,
            debouncer: Debouncer::new(window),
        }
    }

    pub fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    /// Validates the uploads and appends a note for `owner`.
    ///
    /// Refused files are reported in the outcome. The note itself is
    /// refused only when its text is blank and no file was accepted.
    pub fn append(
        &mut self,
        owner: &str,
        text: &str,
        uploads: &[AttachmentUpload],
        now: DateTime<Utc>,
    ) -> AnnotationResult<AppendOutcome> {
        let mut accepted = Vec::new();
        let mut rejections = Vec::new();

        for upload in uploads {
            match self.policy.check(upload) {
                Ok(allowed) => {
                    let extension = self.policy.extension_for(upload, allowed);
                    accepted.push((upload, allowed.kind, extension));
                }
                Err(rejection) => {
                    log_event_with_fields(
                        Event::AttachmentRejected,
                        &[
                            ("name", rejection.name.as_str()),
                            ("owner", owner),
                            ("reason", rejection.reason.code()),
                        ],
                    );
                    rejections.push(rejection);
                }
            }
        }

        if text.trim().is_empty() && accepted.is_empty() {
            return Err(AnnotationError::EmptyNote(rejections));
        }

        let mut attachments = Vec::with_capacity(accepted.len());
        for (upload, kind, extension) in accepted {
            let reference = self.issue_reference(owner, now, &extension);
            self.cache.insert(owner, &reference, upload, now);
            attachments.push(Attachment {
                name: upload.name.clone(),
                kind,
                mime_type: upload.mime_type.clone(),
                size_bytes: upload.size(),
                reference,
                checksum: Attachment::calculate_checksum(&upload.data),
            });
        }

        let annotation = Annotation {
            owner: owner.to_string(),
            text: text.to_string(),
            attachments,
            timestamp: now,
        };
        self.notes
            .entry(owner.to_string())
            .or_default()
            .push(annotation.clone());

        let files = annotation.attachments.len().to_string();
        log_event_with_fields(
            Event::AnnotationAppended,
            &[("files", files.as_str()), ("owner", owner)],
        );

        let flush_due = self.debouncer.schedule(FLUSH_KEY, now, ());
        let due_text = crate::clock::iso_timestamp(flush_due);
        log_event_with_fields(Event::FlushScheduled, &[("due", due_text.as_str())]);

        Ok(AppendOutcome {
            annotation,
            rejections,
            flush_due,
        })
    }

    /// Notes for `owner`, oldest first
    pub fn list(&self, owner: &str) -> &[Annotation] {
        self.notes.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Owners with at least one note
    pub fn owners(&self) -> Vec<&str> {
        self.notes.keys().map(String::as_str).collect()
    }

    pub fn cache(&self) -> &PayloadCache {
        &self.cache
    }

    /// Drops one owner's cached payloads; persisted with the next flush
    pub fn clear_cache(&mut self, owner: &str, now: DateTime<Utc>) -> usize {
        let removed = self.cache.clear(owner);
        if removed > 0 {
            self.debouncer.schedule(FLUSH_KEY, now, ());
        }
        removed
    }

    /// Drops every cached payload; persisted with the next flush
    pub fn clear_all_cache(&mut self, now: DateTime<Utc>) {
        self.cache.clear_all();
        self.debouncer.schedule(FLUSH_KEY, now, ());
    }

    pub fn has_pending_flush(&self) -> bool {
        self.debouncer.is_pending(FLUSH_KEY)
    }

    /// Writes if the debounce window has elapsed
    pub fn poll(&mut self, now: DateTime<Utc>) -> AnnotationResult<Option<FlushReport>> {
        match self.debouncer.poll_due(now).into_iter().next() {
            Some(task) => self.write_or_retry(task.coalesced, now).map(Some),
            None => Ok(None),
        }
    }

    /// Writes any pending flush immediately
    pub fn flush_now(&mut self) -> AnnotationResult<Option<FlushReport>> {
        match self.debouncer.flush_all().into_iter().next() {
            Some(task) => self.write_or_retry(task.coalesced, task.due).map(Some),
            None => Ok(None),
        }
    }

    /// A failed write leaves the flush pending for another window
    fn write_or_retry(&mut self, coalesced: u32, now: DateTime<Utc>) -> AnnotationResult<FlushReport> {
        let result = self.write(coalesced);
        if result.is_err() {
            self.debouncer.schedule(FLUSH_KEY, now, ());
        }
        result
    }

    fn write(&self, coalesced: u32) -> AnnotationResult<FlushReport> {
        // Payloads land before the notes that reference them.
        write_json(self.backend.as_ref(), keys::FILE_CACHE, &self.cache)?;
        write_json(self.backend.as_ref(), keys::USER_NOTES, &self.notes)?;

        let report = FlushReport {
            coalesced,
            owners: self.notes.len(),
        };
        let coalesced_text = coalesced.to_string();
        let owners_text = report.owners.to_string();
        log_event_with_fields(
            Event::FlushComplete,
            &[
                ("coalesced", coalesced_text.as_str()),
                ("owners", owners_text.as_str()),
            ],
        );
        Ok(report)
    }

    /// `{owner}/{millis}.{ext}`, suffixed `-1`, `-2`, … on collision
    fn issue_reference(&mut self, owner: &str, now: DateTime<Utc>, extension: &str) -> String {
        let stem = format!("{}/{}", owner, now.timestamp_millis());
        let mut reference = format!("{}.{}", stem, extension);
        let mut suffix = 0;
        while self.issued.contains(&reference) {
            suffix += 1;
            reference = format!("{}-{}.{}", stem, suffix, extension);
        }
        self.issued.insert(reference.clone());
        reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::RejectionReason;
    use crate::clock::{Clock, ManualClock};
    use crate::persistence::MemoryStore;

    fn open(backend: &Arc<MemoryStore>) -> AnnotationStore {
        AnnotationStore::open(
            backend.clone(),
            AttachmentPolicy::default(),
            Duration::milliseconds(DEFAULT_FLUSH_WINDOW_MS),
        )
    }

    fn pdf(name: &str) -> AttachmentUpload {
        AttachmentUpload::new(name, "application/pdf", vec![7u8; 1024])
    }

    #[test]
    fn test_append_and_list_chronological() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = open(&backend);
        let clock = ManualClock::at_millis(1_000);

        store.append("row-0", "first", &[], clock.now()).unwrap();
        clock.advance_millis(10);
        store.append("row-0", "second", &[], clock.now()).unwrap();

        let texts: Vec<&str> = store.list("row-0").iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert!(store.list("row-9").is_empty());
    }

    #[test]
    fn test_blank_note_without_files_refused() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = open(&backend);
        let clock = ManualClock::at_millis(0);

        let bad = AttachmentUpload::new("x.exe", "application/octet-stream", vec![0]);
        let err = store.append("row-0", "   ", &[bad], clock.now()).unwrap_err();
        assert_eq!(err.to_string(), "Please add a note or attach files");

        match err {
            AnnotationError::EmptyNote(rejections) => {
                assert_eq!(rejections[0].reason, RejectionReason::UnsupportedType);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!store.has_pending_flush());
    }

    #[test]
    fn test_file_only_note_accepted() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = open(&backend);
        let clock = ManualClock::at_millis(1_700_000_000_000);

        let outcome = store.append("row-3", "", &[pdf("report.pdf")], clock.now()).unwrap();
        let attachment = &outcome.annotation.attachments[0];
        assert_eq!(attachment.reference, "row-3/1700000000000.pdf");
        assert_eq!(attachment.size_bytes, 1024);
        assert_eq!(attachment.checksum.len(), 64);
        assert!(store.cache().get("row-3", &attachment.reference).is_some());
    }

    #[test]
    fn test_reference_collisions_get_suffixes() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = open(&backend);
        let clock = ManualClock::at_millis(5);

        let outcome = store
            .append("row-1", "two files", &[pdf("a.pdf"), pdf("b.pdf")], clock.now())
            .unwrap();
        let refs: Vec<&str> = outcome
            .annotation
            .attachments
            .iter()
            .map(|a| a.reference.as_str())
            .collect();
        assert_eq!(refs, vec!["row-1/5.pdf", "row-1/5-1.pdf"]);
    }

    #[test]
    fn test_rapid_appends_coalesce_into_one_write() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = open(&backend);
        let clock = ManualClock::at_millis(0);

        for i in 0..5 {
            store.append("row-0", &format!("n{}", i), &[], clock.now()).unwrap();
            clock.advance_millis(200);
            assert_eq!(store.poll(clock.now()).unwrap(), None);
        }
        assert_eq!(backend.write_count(), 0);

        clock.advance_millis(800);
        let report = store.poll(clock.now()).unwrap().unwrap();
        assert_eq!(report.coalesced, 5);
        assert_eq!(backend.write_count(), 2);

        let reopened = open(&backend);
        assert_eq!(reopened.list("row-0").len(), 5);
    }

    #[test]
    fn test_flush_now_writes_pending() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = open(&backend);
        let clock = ManualClock::at_millis(0);

        store.append("row-0", "note", &[pdf("a.pdf")], clock.now()).unwrap();
        assert!(store.flush_now().unwrap().is_some());
        assert!(store.flush_now().unwrap().is_none());

        let reopened = open(&backend);
        assert_eq!(reopened.cache().len(), 1);
    }

    #[test]
    fn test_reopened_store_does_not_reissue_references() {
        let backend = Arc::new(MemoryStore::new());
        let clock = ManualClock::at_millis(9);
        {
            let mut store = open(&backend);
            store.append("row-0", "", &[pdf("a.pdf")], clock.now()).unwrap();
            store.flush_now().unwrap();
        }
        let mut store = open(&backend);
        let outcome = store.append("row-0", "", &[pdf("a.pdf")], clock.now()).unwrap();
        assert_eq!(outcome.annotation.attachments[0].reference, "row-0/9-1.pdf");
    }

    #[test]
    fn test_flush_failure_reported() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = open(&backend);
        let clock = ManualClock::at_millis(0);

        store.append("row-0", "note", &[], clock.now()).unwrap();
        backend.fail_writes(true);
        assert!(matches!(store.flush_now(), Err(AnnotationError::Storage(_))));
        // The note is still listed in memory
        assert_eq!(store.list("row-0").len(), 1);
    }

    #[test]
    fn test_failed_flush_is_retried() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = open(&backend);
        let clock = ManualClock::at_millis(0);

        store.append("row-0", "note", &[pdf("a.pdf")], clock.now()).unwrap();
        backend.fail_writes(true);
        clock.advance_millis(DEFAULT_FLUSH_WINDOW_MS);
        assert!(store.poll(clock.now()).is_err());
        assert!(store.has_pending_flush());

        backend.fail_writes(false);
        assert_eq!(store.poll(clock.now()).unwrap(), None);
        clock.advance_millis(DEFAULT_FLUSH_WINDOW_MS);
        assert!(store.poll(clock.now()).unwrap().is_some());

        let reopened = open(&backend);
        assert_eq!(reopened.list("row-0").len(), 1);
        assert_eq!(reopened.cache().len(), 1);
    }
}
