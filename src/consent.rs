//! Consent record
//!
//! The user's storage-consent choice, kept under its own key. The per
//! category flags are derived from the choice, never set independently.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::iso8601;
use crate::observability::{log_event_with_fields, Event};
use crate::persistence::{keys, read_json, write_json, KeyValueStore, PersistenceResult};

/// Banner choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentChoice {
    All,
    Necessary,
    Custom,
}

impl ConsentChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentChoice::All => "all",
            ConsentChoice::Necessary => "necessary",
            ConsentChoice::Custom => "custom",
        }
    }
}

/// Stored consent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    #[serde(rename = "type")]
    pub choice: ConsentChoice,
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    pub analytics: bool,
    pub marketing: bool,
    pub necessary: bool,
    pub preferences: bool,
}

impl ConsentRecord {
    pub fn new(choice: ConsentChoice, timestamp: DateTime<Utc>) -> Self {
        let broad = matches!(choice, ConsentChoice::All | ConsentChoice::Custom);
        Self {
            choice,
            timestamp,
            analytics: broad,
            marketing: choice == ConsentChoice::All,
            necessary: true,
            preferences: broad,
        }
    }
}

/// Consent persisted under `cookieConsent`
#[derive(Debug)]
pub struct ConsentStore {
    backend: Arc<dyn KeyValueStore>,
    current: Option<ConsentRecord>,
}

impl ConsentStore {
    pub fn open(backend: Arc<dyn KeyValueStore>) -> Self {
        let current = read_json(backend.as_ref(), keys::COOKIE_CONSENT);
        Self { backend, current }
    }

    pub fn current(&self) -> Option<&ConsentRecord> {
        self.current.as_ref()
    }

    /// True until a choice has been recorded
    pub fn needs_prompt(&self) -> bool {
        self.current.is_none()
    }

    /// Stores `choice`, replacing any earlier one.
    ///
    /// The in-memory record is updated even if the write fails.
    pub fn record(&mut self, choice: ConsentChoice, now: DateTime<Utc>) -> PersistenceResult<&ConsentRecord> {
        let record = ConsentRecord::new(choice, now);
        log_event_with_fields(Event::ConsentRecorded, &[("choice", choice.as_str())]);
        let written = write_json(self.backend.as_ref(), keys::COOKIE_CONSENT, &record);
        let record = &*self.current.insert(record);
        written.map(move |_| record)
    }
}
