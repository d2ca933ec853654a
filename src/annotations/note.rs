//! Annotation record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::iso8601;

use super::attachment::Attachment;

/// Free-text note with attachment metadata, owned by one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub owner: String,
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
}
