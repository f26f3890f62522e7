//! Error types for Docent.
//!
//! A single error enum covers every failure category of the knowledge
//! index: configuration, filesystem, embedding, chunking and persistence.

use thiserror::Error;

/// Unified error type for Docent.
///
/// Fallible functions return `Result<T, AppError>`. The knowledge facade
/// turns these into logged events and fixed user-visible results; nothing
/// panics on a bad file or a broken cache.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Knowledge base errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Embedding provider errors (model loading, remote calls)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Invalid chunking parameters
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// On-disk index could not be written or read back
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_json_error_is_serialization() {
        let err: AppError = serde_json::from_str::<u32>("not a number")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
