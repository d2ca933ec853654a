//! Query engine error types
//!
//! Error codes:
//! - SCOPE_INVALID_PAGE_SIZE (ERROR)
//!
//! Filtering and sorting cannot fail: unknown columns, short rows and
//! mismatched kinds all degrade to non-matching or `Missing` cells. Only
//! the page window has a precondition.

use std::fmt;

/// Severity levels for engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Request rejected, state unchanged
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Engine error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// Page size of zero
    InvalidPageSize,
}

impl ExecutorErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::InvalidPageSize => "SCOPE_INVALID_PAGE_SIZE",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Engine error with code and message
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
}

impl ExecutorError {
    pub fn invalid_page_size(size: usize) -> Self {
        Self {
            code: ExecutorErrorCode::InvalidPageSize,
            message: format!("page size must be at least 1, got {}", size),
        }
    }

    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for ExecutorError {}

/// Result type for engine operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
