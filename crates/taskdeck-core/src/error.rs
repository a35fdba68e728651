use thiserror::Error;

/// Top-level error type for the Taskdeck system.
///
/// Each variant wraps a subsystem-specific failure. Downstream crates map
/// their own errors into these variants so that the `?` operator works
/// seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TaskdeckError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for TaskdeckError {
    fn from(err: toml::de::Error) -> Self {
        TaskdeckError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TaskdeckError {
    fn from(err: toml::ser::Error) -> Self {
        TaskdeckError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TaskdeckError {
    fn from(err: serde_json::Error) -> Self {
        TaskdeckError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Taskdeck operations.
pub type Result<T> = std::result::Result<T, TaskdeckError>;
