//! Line-at-a-time load driver

use crate::error::Result;
use crate::keys::KeyState;
use crate::models::{AlleleRecordSet, Table};
use crate::parser::AlleleInputParser;
use crate::resolver::ReferenceResolver;
use crate::sink::OutputSink;
use crate::transformer::{LineError, RecordTransformer, ValidationError};
use std::collections::BTreeMap;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, info, warn};

/// Counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Every line of the input, blank ones included
    pub lines_read: usize,
    pub blank: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Rows written per table
    pub rows: BTreeMap<Table, usize>,
}

impl LoadStats {
    pub fn rows(&self, table: Table) -> usize {
        self.rows.get(&table).copied().unwrap_or(0)
    }

    fn record(&mut self, set: &AlleleRecordSet) {
        self.accepted += 1;
        for table in Table::ALL {
            *self.rows.entry(table).or_insert(0) += set.row_count(table);
        }
    }
}

/// Reads input lines, transforms them and writes the results
pub struct AlleleLoadPipeline<R, S> {
    transformer: RecordTransformer<R>,
    sink: S,
    keys: KeyState,
}

impl<R, S> AlleleLoadPipeline<R, S>
where
    R: ReferenceResolver,
    S: OutputSink,
{
    pub fn new(transformer: RecordTransformer<R>, sink: S, keys: KeyState) -> Self {
        Self {
            transformer,
            sink,
            keys,
        }
    }

    /// Key state after the lines processed so far
    pub fn keys(&self) -> &KeyState {
        &self.keys
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Process every line of `reader`, then finish the sink
    ///
    /// Rejected lines, including lines that are not UTF-8, are logged and
    /// recorded in the sink. Any other error stops the run.
    pub async fn run<B>(&mut self, mut reader: B) -> Result<LoadStats>
    where
        B: AsyncBufRead + Unpin,
    {
        let mut stats = LoadStats::default();
        let mut buf = Vec::new();

        while reader.read_until(b'\n', &mut buf).await? > 0 {
            stats.lines_read += 1;
            let line_num = stats.lines_read;

            let line = match AlleleInputParser::decode_line(std::mem::take(&mut buf), line_num) {
                Ok(line) => line,
                Err(e) => {
                    self.reject(e, &mut stats)?;
                    continue;
                },
            };

            if AlleleInputParser::is_blank(&line) {
                stats.blank += 1;
                continue;
            }

            match self
                .transformer
                .transform_line(&line, line_num, &mut self.keys)
                .await
            {
                Ok(set) => {
                    debug!(
                        line = line_num,
                        acc_id = %set.accession.acc_id,
                        allele_key = set.allele.allele_key,
                        "Allele created"
                    );
                    self.sink.write_record_set(&set)?;
                    stats.record(&set);
                },
                Err(LineError::Rejected(e)) => self.reject(e, &mut stats)?,
                Err(LineError::Fatal(e)) => {
                    error!(line = line_num, error = %e, "Aborting load");
                    return Err(e);
                },
            }
        }

        self.sink.finish()?;

        info!(
            lines = stats.lines_read,
            accepted = stats.accepted,
            rejected = stats.rejected,
            "Input processed"
        );

        Ok(stats)
    }

    fn reject(&mut self, e: ValidationError, stats: &mut LoadStats) -> Result<()> {
        warn!(
            line = e.line_num,
            category = ?e.category(),
            failures = e.errors.len(),
            "{}",
            e
        );
        self.sink.write_rejection(&e)?;
        stats.rejected += 1;
        Ok(())
    }
}
