//! Output artifacts
//!
//! Accepted lines become rows in nine pipe-delimited bcp files, one per
//! destination table. Rejected lines go to the `.error` file and accepted
//! input lines are echoed, with their new accession ID, to the `.new` file.
//! Every file is truncated when the sink is created, so a rerun replaces the
//! artifacts of an aborted run.

use crate::error::Result;
use crate::models::{
    AccessionReferenceRow, AccessionRow, AlleleRecordSet, AlleleRow, CellLineAssocRow, EchoRow,
    MarkerAssocRow, MutationRow, NoteChunkRow, NoteRow, ReferenceAssocRow, Table,
};
use crate::transformer::{FieldCategory, ValidationError};
use chrono::Local;
use csv::{QuoteStyle, Writer, WriterBuilder};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Locations of every file a run writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    output_dir: PathBuf,
    input_name: String,
}

impl OutputPaths {
    /// Derive output locations from the output directory and the input file
    ///
    /// Per-run logs are named after the input file, e.g. `alleles.txt`
    /// gives `alleles.txt.error`.
    pub fn for_input(output_dir: impl AsRef<Path>, input_file: impl AsRef<Path>) -> Self {
        let input_file = input_file.as_ref();
        let input_name = input_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input_file.to_string_lossy().into_owned());

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            input_name,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// bcp file for `table`
    pub fn table(&self, table: Table) -> PathBuf {
        self.output_dir.join(table.file_name())
    }

    pub fn diagnostics(&self) -> PathBuf {
        self.output_dir.join(format!("{}.diagnostics", self.input_name))
    }

    pub fn error(&self) -> PathBuf {
        self.output_dir.join(format!("{}.error", self.input_name))
    }

    /// Echo of accepted lines with their new accession IDs
    pub fn echo(&self) -> PathBuf {
        self.output_dir.join(format!("{}.new", self.input_name))
    }
}

/// Destination for everything a run produces
///
/// One method per artifact. [`OutputSink::write_record_set`] writes all rows
/// of an accepted line in table order.
pub trait OutputSink {
    fn write_allele(&mut self, row: &AlleleRow) -> Result<()>;
    fn write_marker_assoc(&mut self, row: &MarkerAssocRow) -> Result<()>;
    fn write_mutation(&mut self, row: &MutationRow) -> Result<()>;
    fn write_cell_line_assoc(&mut self, row: &CellLineAssocRow) -> Result<()>;
    fn write_reference_assoc(&mut self, row: &ReferenceAssocRow) -> Result<()>;
    fn write_accession(&mut self, row: &AccessionRow) -> Result<()>;
    fn write_accession_reference(&mut self, row: &AccessionReferenceRow) -> Result<()>;
    fn write_note(&mut self, row: &NoteRow) -> Result<()>;
    fn write_note_chunk(&mut self, row: &NoteChunkRow) -> Result<()>;
    fn write_echo(&mut self, row: &EchoRow) -> Result<()>;

    /// Record a rejected line
    fn write_rejection(&mut self, error: &ValidationError) -> Result<()>;

    /// Flush and close out every artifact
    fn finish(&mut self) -> Result<()>;

    fn write_record_set(&mut self, set: &AlleleRecordSet) -> Result<()> {
        self.write_allele(&set.allele)?;
        self.write_marker_assoc(&set.marker_assoc)?;
        for row in &set.mutations {
            self.write_mutation(row)?;
        }
        if let Some(row) = &set.cell_line_assoc {
            self.write_cell_line_assoc(row)?;
        }
        for row in &set.reference_assocs {
            self.write_reference_assoc(row)?;
        }
        self.write_accession(&set.accession)?;
        for row in &set.accession_references {
            self.write_accession_reference(row)?;
        }
        for note in &set.notes {
            self.write_note(&note.note)?;
            for chunk in &note.chunks {
                self.write_note_chunk(chunk)?;
            }
        }
        self.write_echo(&set.echo)
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn bcp_writer(path: &Path) -> Result<Writer<File>> {
    let writer = WriterBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .quote_style(QuoteStyle::Necessary)
        .from_path(path)?;
    Ok(writer)
}

/// Writes bcp files and run logs into the output directory
pub struct BcpFileSink {
    paths: OutputPaths,
    allele: Writer<File>,
    marker_assoc: Writer<File>,
    mutation: Writer<File>,
    cell_line: Writer<File>,
    reference_assoc: Writer<File>,
    accession: Writer<File>,
    accession_reference: Writer<File>,
    note: Writer<File>,
    note_chunk: Writer<File>,
    errors: BufWriter<File>,
    echo: BufWriter<File>,
    finished: bool,
}

impl BcpFileSink {
    /// Create (or truncate) every output file
    pub fn create(paths: OutputPaths) -> Result<Self> {
        fs::create_dir_all(paths.output_dir())?;

        let mut errors = BufWriter::new(File::create(paths.error())?);
        writeln!(errors, "Start Date/Time: {}\n", timestamp())?;

        let echo = BufWriter::new(File::create(paths.echo())?);

        let sink = Self {
            allele: bcp_writer(&paths.table(Table::Allele))?,
            marker_assoc: bcp_writer(&paths.table(Table::MarkerAssoc))?,
            mutation: bcp_writer(&paths.table(Table::Mutation))?,
            cell_line: bcp_writer(&paths.table(Table::CellLine))?,
            reference_assoc: bcp_writer(&paths.table(Table::ReferenceAssoc))?,
            accession: bcp_writer(&paths.table(Table::Accession))?,
            accession_reference: bcp_writer(&paths.table(Table::AccessionReference))?,
            note: bcp_writer(&paths.table(Table::Note))?,
            note_chunk: bcp_writer(&paths.table(Table::NoteChunk))?,
            errors,
            echo,
            paths,
            finished: false,
        };

        debug!(dir = %sink.paths.output_dir().display(), "Output files created");
        Ok(sink)
    }

    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }

    fn writer(&mut self, table: Table) -> &mut Writer<File> {
        match table {
            Table::Allele => &mut self.allele,
            Table::MarkerAssoc => &mut self.marker_assoc,
            Table::Mutation => &mut self.mutation,
            Table::CellLine => &mut self.cell_line,
            Table::ReferenceAssoc => &mut self.reference_assoc,
            Table::Accession => &mut self.accession,
            Table::AccessionReference => &mut self.accession_reference,
            Table::Note => &mut self.note,
            Table::NoteChunk => &mut self.note_chunk,
        }
    }

    fn write_row<T: Serialize>(&mut self, table: Table, row: &T) -> Result<()> {
        self.writer(table).serialize(row)?;
        Ok(())
    }
}

impl OutputSink for BcpFileSink {
    fn write_allele(&mut self, row: &AlleleRow) -> Result<()> {
        self.write_row(Table::Allele, row)
    }

    fn write_marker_assoc(&mut self, row: &MarkerAssocRow) -> Result<()> {
        self.write_row(Table::MarkerAssoc, row)
    }

    fn write_mutation(&mut self, row: &MutationRow) -> Result<()> {
        self.write_row(Table::Mutation, row)
    }

    fn write_cell_line_assoc(&mut self, row: &CellLineAssocRow) -> Result<()> {
        self.write_row(Table::CellLine, row)
    }

    fn write_reference_assoc(&mut self, row: &ReferenceAssocRow) -> Result<()> {
        self.write_row(Table::ReferenceAssoc, row)
    }

    fn write_accession(&mut self, row: &AccessionRow) -> Result<()> {
        self.write_row(Table::Accession, row)
    }

    fn write_accession_reference(&mut self, row: &AccessionReferenceRow) -> Result<()> {
        self.write_row(Table::AccessionReference, row)
    }

    fn write_note(&mut self, row: &NoteRow) -> Result<()> {
        self.write_row(Table::Note, row)
    }

    fn write_note_chunk(&mut self, row: &NoteChunkRow) -> Result<()> {
        self.write_row(Table::NoteChunk, row)
    }

    fn write_echo(&mut self, row: &EchoRow) -> Result<()> {
        writeln!(self.echo, "{}", row.to_line())?;
        Ok(())
    }

    fn write_rejection(&mut self, error: &ValidationError) -> Result<()> {
        for field in &error.errors {
            writeln!(self.errors, "{} ({}): {}", field.category, error.line_num, field.value)?;
        }
        if error.category() == Some(FieldCategory::InvalidLine) {
            writeln!(self.errors, "\t{}", error.raw)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }

        for table in Table::ALL {
            self.writer(table).flush()?;
        }
        self.echo.flush()?;
        writeln!(self.errors, "\nEnd Date/Time: {}", timestamp())?;
        self.errors.flush()?;
        self.finished = true;

        info!(dir = %self.paths.output_dir().display(), "Output files written");
        Ok(())
    }
}
