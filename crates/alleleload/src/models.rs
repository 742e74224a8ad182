//! Allele load data models
//!
//! [`AlleleInput`] is one parsed input line. The `*Row` types are the rows
//! of the nine destination tables; their field order is the column order of
//! the table, which is also the column order of the bcp file written for it.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Minimum number of tab-separated fields in an input line
pub const REQUIRED_FIELD_COUNT: usize = 19;

/// One allele description from the generic input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleInput {
    pub line_num: usize,
    /// The line as read, without its line terminator
    pub raw: String,
    pub marker_id: String,
    pub symbol: String,
    pub name: String,
    pub status: String,
    /// Allele generation
    pub allele_type: String,
    /// Not loaded; carried through to the echo file
    pub subtype: String,
    /// Not loaded; carried through to the echo file
    pub collection: String,
    pub germline_transmission: String,
    /// `Role|J#` pairs joined with `||`
    pub references: String,
    pub strain_of_origin: String,
    pub mutant_cell_line: String,
    pub molecular_notes: String,
    pub driver_notes: String,
    pub ikmc_colony_notes: String,
    /// Mutation terms joined with `|`
    pub molecular_mutations: String,
    pub inheritance_mode: String,
    pub mixed: String,
    pub extinct: String,
    pub created_by: String,
    pub add_cell_line_to_new_allele: Option<String>,
    pub add_cell_line_to_existing_allele: Option<String>,
}

/// `ALL_Allele`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlleleRow {
    pub allele_key: i64,
    pub marker_key: i64,
    pub strain_key: i64,
    pub mode_key: i64,
    pub allele_type_key: i64,
    pub allele_status_key: i64,
    pub transmission_key: i64,
    pub symbol: String,
    pub name: String,
    pub nomen_symbol: Option<String>,
    pub is_wild_type: i16,
    pub is_extinct: i16,
    pub is_mixed: i16,
    pub created_by_key: i64,
    pub modified_by_key: i64,
    pub approved_by_key: i64,
    pub approval_date: NaiveDateTime,
    pub creation_date: NaiveDateTime,
    pub modification_date: NaiveDateTime,
}

/// `ALL_Marker_Assoc`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerAssocRow {
    pub assoc_key: i64,
    pub allele_key: i64,
    pub marker_key: i64,
    pub qualifier_key: i64,
    pub refs_key: i64,
    pub status_key: i64,
    pub created_by_key: i64,
    pub modified_by_key: i64,
    pub creation_date: NaiveDateTime,
    pub modification_date: NaiveDateTime,
}

/// `ALL_Allele_Mutation`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationRow {
    pub allele_key: i64,
    pub mutation_key: i64,
    pub creation_date: NaiveDateTime,
    pub modification_date: NaiveDateTime,
}

/// `ALL_Allele_CellLine`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellLineAssocRow {
    pub assoc_key: i64,
    pub allele_key: i64,
    pub mutant_cell_line_key: i64,
    pub created_by_key: i64,
    pub modified_by_key: i64,
    pub creation_date: NaiveDateTime,
    pub modification_date: NaiveDateTime,
}

/// `MGI_Reference_Assoc`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceAssocRow {
    pub assoc_key: i64,
    pub refs_key: i64,
    pub object_key: i64,
    pub mgi_type_key: i64,
    pub ref_assoc_type_key: i64,
    pub created_by_key: i64,
    pub modified_by_key: i64,
    pub creation_date: NaiveDateTime,
    pub modification_date: NaiveDateTime,
}

/// `MGI_Note`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteRow {
    pub note_key: i64,
    pub object_key: i64,
    pub mgi_type_key: i64,
    pub note_type_key: i64,
    pub created_by_key: i64,
    pub modified_by_key: i64,
    pub creation_date: NaiveDateTime,
    pub modification_date: NaiveDateTime,
}

/// `MGI_NoteChunk`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteChunkRow {
    pub note_key: i64,
    pub sequence_num: i64,
    pub note: String,
    pub created_by_key: i64,
    pub modified_by_key: i64,
    pub creation_date: NaiveDateTime,
    pub modification_date: NaiveDateTime,
}

/// `ACC_Accession`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessionRow {
    pub accession_key: i64,
    pub acc_id: String,
    pub prefix_part: String,
    pub numeric_part: i64,
    pub logical_db_key: i64,
    pub object_key: i64,
    pub mgi_type_key: i64,
    pub private: i16,
    pub preferred: i16,
    pub created_by_key: i64,
    pub modified_by_key: i64,
    pub creation_date: NaiveDateTime,
    pub modification_date: NaiveDateTime,
}

/// `ACC_AccessionReference`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessionReferenceRow {
    pub accession_key: i64,
    pub refs_key: i64,
    pub created_by_key: i64,
    pub modified_by_key: i64,
    pub creation_date: NaiveDateTime,
    pub modification_date: NaiveDateTime,
}

/// A note header with its chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub note: NoteRow,
    pub chunks: Vec<NoteChunkRow>,
}

/// Input line echoed back with the accession ID it was given
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoRow {
    pub raw: String,
    pub acc_id: String,
}

impl EchoRow {
    /// The echoed line: input fields, then the new ID as the last field
    pub fn to_line(&self) -> String {
        format!("{}\t{}", self.raw, self.acc_id)
    }
}

/// Every row produced for one accepted input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleRecordSet {
    pub allele: AlleleRow,
    pub marker_assoc: MarkerAssocRow,
    pub mutations: Vec<MutationRow>,
    pub reference_assocs: Vec<ReferenceAssocRow>,
    pub cell_line_assoc: Option<CellLineAssocRow>,
    pub notes: Vec<NoteRecord>,
    pub accession: AccessionRow,
    pub accession_references: Vec<AccessionReferenceRow>,
    pub echo: EchoRow,
}

impl AlleleRecordSet {
    /// Number of rows this set contributes to `table`
    pub fn row_count(&self, table: Table) -> usize {
        match table {
            Table::Allele | Table::MarkerAssoc | Table::Accession => 1,
            Table::Mutation => self.mutations.len(),
            Table::CellLine => usize::from(self.cell_line_assoc.is_some()),
            Table::ReferenceAssoc => self.reference_assocs.len(),
            Table::AccessionReference => self.accession_references.len(),
            Table::Note => self.notes.len(),
            Table::NoteChunk => self.notes.iter().map(|n| n.chunks.len()).sum(),
        }
    }
}

/// Destination tables, one bcp file each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Allele,
    MarkerAssoc,
    Mutation,
    CellLine,
    ReferenceAssoc,
    Accession,
    AccessionReference,
    Note,
    NoteChunk,
}

impl Table {
    /// All tables in bulk-load order
    pub const ALL: [Table; 9] = [
        Table::Allele,
        Table::MarkerAssoc,
        Table::Mutation,
        Table::CellLine,
        Table::ReferenceAssoc,
        Table::Accession,
        Table::AccessionReference,
        Table::Note,
        Table::NoteChunk,
    ];

    /// Schema name of the table
    pub fn name(self) -> &'static str {
        match self {
            Table::Allele => "ALL_Allele",
            Table::MarkerAssoc => "ALL_Marker_Assoc",
            Table::Mutation => "ALL_Allele_Mutation",
            Table::CellLine => "ALL_Allele_CellLine",
            Table::ReferenceAssoc => "MGI_Reference_Assoc",
            Table::Accession => "ACC_Accession",
            Table::AccessionReference => "ACC_AccessionReference",
            Table::Note => "MGI_Note",
            Table::NoteChunk => "MGI_NoteChunk",
        }
    }

    /// PostgreSQL identifier (unquoted names fold to lower case)
    pub fn db_name(self) -> String {
        self.name().to_lowercase()
    }

    /// Name of the bcp file written for the table
    pub fn file_name(self) -> String {
        format!("{}.bcp", self.name())
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
