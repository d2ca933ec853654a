//! User-visible notifications

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// Transient message for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub code: String,
    pub message: String,
}

impl Notification {
    pub fn success(code: &str, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, code, message)
    }

    pub fn info(code: &str, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, code, message)
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, code, message)
    }

    fn new(level: NotificationLevel, code: &str, message: impl Into<String>) -> Self {
        Self {
            level,
            code: code.to_string(),
            message: message.into(),
        }
    }
}
