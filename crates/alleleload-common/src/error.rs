//! Error types shared by the allele load crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors that are not specific to one pipeline stage
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl LoadError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a configuration error for a required variable that is unset
    pub fn missing_var(name: &str) -> Self {
        Self::Config(format!("{} is not set", name))
    }
}
