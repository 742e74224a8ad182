//! Allele Load Common Library
//!
//! Shared error handling and logging for the allele load workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`LoadError`] and the [`Result`] alias
//! - **Logging**: console plus per-run diagnostics file via `tracing`
//!
//! # Example
//!
//! ```no_run
//! use alleleload_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     let _guard = init_logging(&config)?;
//!     tracing::info!("Load started");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{LoadError, Result};
