//! End-of-run database load
//!
//! Each bcp file is streamed into its table with `COPY ... FROM STDIN`, one
//! table at a time. There is no transaction spanning the tables: a table
//! that fails to load does not undo the ones already loaded, and the loader
//! moves on to the next table regardless.

use crate::error::{AlleleLoadError, Result};
use crate::models::Table;
use crate::sink::OutputPaths;
use alleleload_common::LoadError;
use sqlx::PgPool;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of loading every table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkLoadReport {
    /// Tables loaded, with the row count reported by the server
    pub loaded: Vec<(Table, u64)>,
    /// Tables that failed, with the reason
    pub failed: Vec<(Table, String)>,
}

impl BulkLoadReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_rows(&self) -> u64 {
        self.loaded.iter().map(|(_, rows)| rows).sum()
    }

    /// Whether the accession maximum must be advanced
    ///
    /// Tables load independently, so once the accession table is in the
    /// database its `MGI:` numbers are taken whatever happened to the others.
    pub fn should_advance_accession_max(&self) -> bool {
        self.loaded.iter().any(|(table, _)| *table == Table::Accession)
    }

    /// Turn a report with failures into a [`AlleleLoadError::BulkLoad`]
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(AlleleLoadError::BulkLoad {
            tables: self.failed.iter().map(|(t, _)| t.name().to_string()).collect(),
        })
    }
}

/// Loads bcp files into PostgreSQL
pub struct BulkLoader {
    pool: PgPool,
}

impl BulkLoader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load every table's file, in [`Table::ALL`] order
    pub async fn load_all(&self, paths: &OutputPaths) -> BulkLoadReport {
        let mut report = BulkLoadReport::default();

        for table in Table::ALL {
            let path = paths.table(table);
            match self.load_table(table, &path).await {
                Ok(rows) => {
                    info!(table = %table, rows, "Table loaded");
                    report.loaded.push((table, rows));
                },
                Err(e) => {
                    error!(table = %table, path = %path.display(), error = %e, "Table load failed");
                    report.failed.push((table, e.to_string()));
                },
            }
        }

        report
    }

    /// Stream one bcp file into its table
    pub async fn load_table(&self, table: Table, path: &Path) -> Result<u64> {
        let mut file = tokio::fs::File::open(path).await?;
        if file.metadata().await?.len() == 0 {
            return Ok(0);
        }

        let sql = copy_statement(table);
        let mut conn = self.pool.acquire().await?;
        let mut copy = conn.copy_in_raw(&sql).await?;

        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        loop {
            let n = match file.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    copy.abort(e.to_string()).await?;
                    return Err(e.into());
                },
            };
            copy.send(&buf[..n]).await?;
        }

        Ok(copy.finish().await?)
    }
}

/// `COPY` statement matching the bcp file format
pub fn copy_statement(table: Table) -> String {
    format!(
        "COPY {} FROM STDIN (FORMAT csv, DELIMITER '|', NULL '')",
        table.db_name()
    )
}

/// Advance the persisted accession maximum by the number of accepted lines
///
/// The next run's key initialization starts after the numbers handed out
/// by this one.
pub async fn advance_accession_max(pool: &PgPool, prefix: &str, accepted: u64) -> Result<()> {
    if accepted == 0 {
        info!(prefix, "No alleles created, accession maximum unchanged");
        return Ok(());
    }

    let increment = i64::try_from(accepted)
        .map_err(|_| LoadError::Database(format!("accepted count {} out of range", accepted)))?;

    let result = sqlx::query(
        "UPDATE acc_accessionmax SET maxnumericpart = maxnumericpart + $1 WHERE prefixpart = $2",
    )
    .bind(increment)
    .bind(prefix)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        warn!(prefix, "No accession maximum row to advance");
        return Err(LoadError::Database(format!("no acc_accessionmax row for prefix {}", prefix)).into());
    }

    info!(prefix, increment, "Accession maximum advanced");
    Ok(())
}
