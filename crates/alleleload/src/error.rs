//! Fatal error type for the allele load
//!
//! Anything represented here aborts the run. Per-line validation failures
//! are not errors in this sense; see [`crate::transformer::ValidationError`].

use crate::keys::KeySpace;
use alleleload_common::LoadError;

/// Result type for allele load operations
pub type Result<T> = std::result::Result<T, AlleleLoadError>;

/// Errors that abort an allele load run
#[derive(Debug, thiserror::Error)]
pub enum AlleleLoadError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Load file error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Common(#[from] LoadError),

    #[error("Cannot initialize {space} key: {reason}")]
    KeyInit { space: KeySpace, reason: String },

    #[error("Bulk load failed for {}", .tables.join(", "))]
    BulkLoad { tables: Vec<String> },
}

impl AlleleLoadError {
    pub fn key_init(space: KeySpace, reason: impl Into<String>) -> Self {
        Self::KeyInit {
            space,
            reason: reason.into(),
        }
    }
}
