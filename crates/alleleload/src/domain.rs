//! Fixed domain values of the MGI allele schema
//!
//! These are constants of the curation database, not configuration: the
//! term keys for the marker-association qualifier and status, the note and
//! reference-association type codes, and the controlled vocabularies that
//! allele attributes are resolved against.

use serde::{Deserialize, Serialize};

/// Public accession prefix for new alleles
pub const MGI_PREFIX: &str = "MGI:";

/// `_MGIType_key` of an Allele
pub const MGI_TYPE_ALLELE: i64 = 11;

/// `_LogicalDB_key` of MGI accession IDs
pub const LOGICAL_DB_MGI: i64 = 1;

/// Marker-allele association qualifier "Not Specified" (vocabulary 70)
pub const QUALIFIER_NOT_SPECIFIED: i64 = 4_268_547;

/// Marker-allele association status "Curated" (vocabulary 73)
pub const MARKER_STATUS_CURATED: i64 = 4_268_545;

/// Cell-line key used when a mutant cell line name does not resolve
pub const UNRESOLVED_CELL_LINE: i64 = 0;

/// Storage width of `MGI_NoteChunk.note`
pub const NOTE_CHUNK_SIZE: usize = 255;

/// Controlled vocabularies that allele attributes are resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vocabulary {
    InheritanceMode,
    MolecularMutation,
    AlleleStatus,
    AlleleType,
    Transmission,
}

impl Vocabulary {
    /// `_Vocab_key` in the vocabulary table
    pub fn key(self) -> i64 {
        match self {
            Vocabulary::InheritanceMode => 35,
            Vocabulary::MolecularMutation => 36,
            Vocabulary::AlleleStatus => 37,
            Vocabulary::AlleleType => 38,
            Vocabulary::Transmission => 61,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Vocabulary::InheritanceMode => "Allele Inheritance Mode",
            Vocabulary::MolecularMutation => "Allele Molecular Mutation",
            Vocabulary::AlleleStatus => "Allele Status",
            Vocabulary::AlleleType => "Allele Type",
            Vocabulary::Transmission => "Allele Transmission",
        }
    }
}

impl std::fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a cited reference in the multi-reference input field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceRole {
    Original,
    Transmission,
    Molecular,
}

impl ReferenceRole {
    /// Parse the role label used in input files; unknown labels yield `None`
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "Original" => Some(ReferenceRole::Original),
            "Transmission" => Some(ReferenceRole::Transmission),
            "Molecular" => Some(ReferenceRole::Molecular),
            _ => None,
        }
    }

    /// `_RefAssocType_key` for allele reference associations
    pub fn type_key(self) -> i64 {
        match self {
            ReferenceRole::Original => 1011,
            ReferenceRole::Molecular => 1012,
            ReferenceRole::Transmission => 1023,
        }
    }
}

/// Category of a free-text allele note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteType {
    Molecular,
    Driver,
    IkmcColony,
}

impl NoteType {
    /// `_NoteType_key` in `MGI_Note`
    pub fn type_key(self) -> i64 {
        match self {
            NoteType::Molecular => 1021,
            NoteType::Driver => 1034,
            NoteType::IkmcColony => 1041,
        }
    }
}
