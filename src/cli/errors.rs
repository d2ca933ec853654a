//! CLI-specific error types
//!
//! CLI errors end the process. Errors inside a running session never do;
//! they come back as notifications on the reply.

use std::fmt;
use std::io;

use crate::observability::Severity;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file missing or invalid
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Malformed event JSON
    InvalidEvent,
    /// Dataset unreadable or inconsistent with the layout
    DatasetError,
    /// Data directory already initialized
    AlreadyInitialized,
    /// Data directory not initialized
    NotInitialized,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "SCOPE_CLI_CONFIG_ERROR",
            Self::IoError => "SCOPE_CLI_IO_ERROR",
            Self::InvalidEvent => "SCOPE_CLI_INVALID_EVENT",
            Self::DatasetError => "SCOPE_CLI_DATASET_ERROR",
            Self::AlreadyInitialized => "SCOPE_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "SCOPE_CLI_NOT_INITIALIZED",
        }
    }

    /// A bad event is recoverable; the rest stop the command
    pub fn severity(&self) -> Severity {
        match self {
            Self::InvalidEvent => Severity::Warn,
            _ => Severity::Error,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_event(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidEvent, msg)
    }

    pub fn dataset_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::DatasetError, msg)
    }

    pub fn already_initialized() -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            "Data directory already initialized",
        )
    }

    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "Data directory not initialized. Run 'sheetscope init' first.",
        )
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity().as_str(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::invalid_event(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
