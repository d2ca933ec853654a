//! # Configuration Store Errors

use thiserror::Error;
use uuid::Uuid;

use crate::persistence::PersistenceError;

/// Result type for configuration store operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration store errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Snapshot not found: {0}")]
    NotFound(Uuid),

    /// The in-memory list changed but could not be written
    #[error("Snapshot list not persisted: {0}")]
    Storage(#[from] PersistenceError),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "snapshot_not_found",
            ConfigError::Storage(e) => e.code(),
        }
    }
}
