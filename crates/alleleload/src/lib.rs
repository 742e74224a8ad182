//! MGI allele load
//!
//! Reads the generic tab-delimited allele input file, resolves each line
//! against the MGI reference data, assigns new keys and accession IDs, and
//! writes one bcp file per destination table for bulk loading.
//!
//! # Example
//!
//! ```no_run
//! use alleleload::keys::{initialize_keys, PgKeySource};
//! use alleleload::pipeline::AlleleLoadPipeline;
//! use alleleload::resolver::PgResolver;
//! use alleleload::sink::{BcpFileSink, OutputPaths};
//! use alleleload::transformer::RecordTransformer;
//! use tokio::io::BufReader;
//!
//! # async fn run(pool: sqlx::PgPool) -> alleleload::Result<()> {
//! let keys = initialize_keys(&mut PgKeySource::new(pool.clone())).await?;
//! let transformer = RecordTransformer::new(
//!     PgResolver::new(pool),
//!     "J:136110",
//!     chrono::Local::now().naive_local(),
//! );
//! let sink = BcpFileSink::create(OutputPaths::for_input("./out", "alleles.txt"))?;
//!
//! let input = tokio::fs::File::open("alleles.txt").await?;
//! let stats = AlleleLoadPipeline::new(transformer, sink, keys)
//!     .run(BufReader::new(input))
//!     .await?;
//! println!("{} alleles created", stats.accepted);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod bulk;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod keys;
pub mod models;
pub mod notes;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod sink;
pub mod transformer;

pub use error::{AlleleLoadError, Result};
