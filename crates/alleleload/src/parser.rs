//! Generic allele input parser
//!
//! Each input line is one allele, tab-delimited and positional:
//!
//! ```text
//! MarkerID  Symbol  Name  Status  Type  Subtype  Collection  Germline
//! References  StrainOfOrigin  MutantCellLine  MolecularNotes  DriverNotes
//! IKMCColonyNotes  MolecularMutation  InheritanceMode  Mixed  Extinct
//! CreatedBy  [AddCellLineToNewAllele  AddCellLineToExistingAllele]
//! ```
//!
//! The first 19 fields are required. Field values are taken verbatim.

use crate::models::{AlleleInput, REQUIRED_FIELD_COUNT};
use crate::transformer::{FieldCategory, FieldError, ValidationError};

/// Parser for allele input lines
#[derive(Debug, Clone, Copy, Default)]
pub struct AlleleInputParser;

impl AlleleInputParser {
    pub fn new() -> Self {
        Self
    }

    /// Strip the line terminator left by the reader
    pub fn trim_line(line: &str) -> &str {
        line.trim_end_matches(['\n', '\r'])
    }

    /// Whether a line carries no data and should be skipped
    ///
    /// Only spaces count as empty. A line of tabs has empty fields and is
    /// parsed like any other.
    pub fn is_blank(line: &str) -> bool {
        Self::trim_line(line).trim_matches(' ').is_empty()
    }

    /// Decode the raw bytes of one line
    ///
    /// Bytes that are not UTF-8 reject the line as `InvalidLine`; the raw
    /// text is kept with the bad bytes replaced.
    pub fn decode_line(
        bytes: Vec<u8>,
        line_num: usize,
    ) -> std::result::Result<String, ValidationError> {
        String::from_utf8(bytes).map_err(|e| {
            let valid_up_to = e.utf8_error().valid_up_to();
            let raw = String::from_utf8_lossy(e.as_bytes());
            ValidationError::new(
                line_num,
                Self::trim_line(&raw),
                vec![FieldError::new(
                    FieldCategory::InvalidLine,
                    format!("invalid UTF-8 at byte {}", valid_up_to),
                )],
            )
        })
    }

    /// Parse a single input line
    ///
    /// A line with fewer than 19 fields is rejected as `InvalidLine`.
    pub fn parse_line(
        &self,
        line: &str,
        line_num: usize,
    ) -> std::result::Result<AlleleInput, ValidationError> {
        let raw = Self::trim_line(line);
        let fields: Vec<&str> = raw.split('\t').collect();

        if fields.len() < REQUIRED_FIELD_COUNT {
            return Err(ValidationError::new(
                line_num,
                raw,
                vec![FieldError::new(
                    FieldCategory::InvalidLine,
                    format!(
                        "expected at least {} fields, found {}",
                        REQUIRED_FIELD_COUNT,
                        fields.len()
                    ),
                )],
            ));
        }

        let field = |i: usize| fields[i].to_string();
        let optional = |i: usize| fields.get(i).map(|s| s.to_string());

        Ok(AlleleInput {
            line_num,
            raw: raw.to_string(),
            marker_id: field(0),
            symbol: field(1),
            name: field(2),
            status: field(3),
            allele_type: field(4),
            subtype: field(5),
            collection: field(6),
            germline_transmission: field(7),
            references: field(8),
            strain_of_origin: field(9),
            mutant_cell_line: field(10),
            molecular_notes: field(11),
            driver_notes: field(12),
            ikmc_colony_notes: field(13),
            molecular_mutations: field(14),
            inheritance_mode: field(15),
            mixed: field(16),
            extinct: field(17),
            created_by: field(18),
            add_cell_line_to_new_allele: optional(19),
            add_cell_line_to_existing_allele: optional(20),
        })
    }
}
