//! # Persistence Errors

use thiserror::Error;

/// Result type for durable storage operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Durable key-value storage errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistenceError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("I/O error on {0}: {1}")]
    Io(String, String),

    #[error("Stored value under {0} is not valid: {1}")]
    Corrupt(String, String),

    #[error("Could not encode value for {0}: {1}")]
    Encode(String, String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    /// Stable machine-readable code for notifications
    pub fn code(&self) -> &'static str {
        match self {
            PersistenceError::InvalidKey(_) => "storage_invalid_key",
            PersistenceError::Io(_, _) => "storage_io",
            PersistenceError::Corrupt(_, _) => "storage_corrupt",
            PersistenceError::Encode(_, _) => "storage_encode",
            PersistenceError::Unavailable(_) => "storage_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(PersistenceError::InvalidKey("a/b".into()).code(), "storage_invalid_key");
        assert_eq!(
            PersistenceError::Io("configs".into(), "denied".into()).to_string(),
            "I/O error on configs: denied"
        );
    }
}
