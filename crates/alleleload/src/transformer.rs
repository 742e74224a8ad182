//! Record transformer
//!
//! Turns one input line into the full set of rows for a new allele. Work is
//! split into three phases:
//!
//! 1. parse the line into an [`AlleleInput`]
//! 2. resolve every field against the reference data, collecting every miss
//! 3. assemble rows, drawing keys from the [`KeyState`]
//!
//! Only phase 3 touches the key counters and it cannot fail, so a rejected
//! line never consumes a key.

use crate::domain::{
    NoteType, ReferenceRole, Vocabulary, LOGICAL_DB_MGI, MARKER_STATUS_CURATED, MGI_PREFIX,
    MGI_TYPE_ALLELE, NOTE_CHUNK_SIZE, QUALIFIER_NOT_SPECIFIED, UNRESOLVED_CELL_LINE,
};
use crate::error::AlleleLoadError;
use crate::keys::{KeySpace, KeyState};
use crate::models::{
    AccessionRow, AlleleInput, AlleleRecordSet, AlleleRow, CellLineAssocRow, EchoRow,
    MarkerAssocRow, MutationRow, NoteChunkRow, NoteRecord, NoteRow, ReferenceAssocRow,
};
use crate::notes::chunk_note;
use crate::parser::AlleleInputParser;
use crate::resolver::ReferenceResolver;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Field group a validation failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldCategory {
    InvalidLine,
    Marker,
    Status,
    AlleleType,
    Germline,
    InheritanceMode,
    StrainOfOrigin,
    /// The configured reference stamped on the marker association
    Reference,
    Creator,
    MolecularMutation,
    OtherReference,
    ReferenceRole,
    Mixed,
    Extinct,
}

impl FieldCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldCategory::InvalidLine => "Invalid Line",
            FieldCategory::Marker => "Invalid Marker",
            FieldCategory::Status => "Invalid Allele Status",
            FieldCategory::AlleleType => "Invalid Allele Type",
            FieldCategory::Germline => "Invalid Germline Transmission",
            FieldCategory::InheritanceMode => "Invalid Inheritance Mode",
            FieldCategory::StrainOfOrigin => "Invalid Strain",
            FieldCategory::Reference => "Invalid Reference",
            FieldCategory::Creator => "Invalid Creator",
            FieldCategory::MolecularMutation => "Invalid Molecular Mutation",
            FieldCategory::OtherReference => "Invalid Allele Reference",
            FieldCategory::ReferenceRole => "Invalid Reference Role",
            FieldCategory::Mixed => "Invalid Mixed Flag",
            FieldCategory::Extinct => "Invalid Extinct Flag",
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed field of a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub category: FieldCategory,
    /// The offending value, or a short description for structural failures
    pub value: String,
}

impl FieldError {
    pub fn new(category: FieldCategory, value: impl Into<String>) -> Self {
        Self {
            category,
            value: value.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: '{}'", self.category, self.value)
    }
}

/// Why a line was rejected
///
/// Holds every failed field in the order resolution was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub line_num: usize,
    pub raw: String,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(line_num: usize, raw: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            line_num,
            raw: raw.into(),
            errors,
        }
    }

    /// Category of the first failure
    pub fn category(&self) -> Option<FieldCategory> {
        self.errors.first().map(|e| e.category)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} rejected", self.line_num)?;
        for (i, error) in self.errors.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

/// Outcome of a line that produced no rows
#[derive(Debug)]
pub enum LineError {
    /// The line is bad; log it and move on
    Rejected(ValidationError),
    /// The run cannot continue
    Fatal(AlleleLoadError),
}

impl From<ValidationError> for LineError {
    fn from(e: ValidationError) -> Self {
        LineError::Rejected(e)
    }
}

impl From<AlleleLoadError> for LineError {
    fn from(e: AlleleLoadError) -> Self {
        LineError::Fatal(e)
    }
}

/// An input line whose every field resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAllele {
    pub input: AlleleInput,
    pub marker_key: i64,
    pub allele_status_key: i64,
    pub allele_type_key: i64,
    pub transmission_key: i64,
    pub mode_key: i64,
    pub strain_key: i64,
    pub refs_key: i64,
    pub created_by_key: i64,
    pub is_mixed: i16,
    pub is_extinct: i16,
    pub mutation_keys: Vec<i64>,
    pub references: Vec<(ReferenceRole, i64)>,
    /// `None` when the line names no cell line
    pub mutant_cell_line_key: Option<i64>,
}

/// Collects misses while a line is resolved
struct Misses(Vec<FieldError>);

impl Misses {
    fn require(&mut self, key: Option<i64>, category: FieldCategory, value: &str) -> i64 {
        key.unwrap_or_else(|| {
            self.0.push(FieldError::new(category, value));
            0
        })
    }

    fn flag(&mut self, value: &str, category: FieldCategory) -> i16 {
        match value {
            "0" => 0,
            "1" => 1,
            _ => {
                self.0.push(FieldError::new(category, value));
                0
            },
        }
    }
}

/// Transforms input lines into allele record sets
pub struct RecordTransformer<R> {
    resolver: R,
    parser: AlleleInputParser,
    jnumber: String,
    load_date: NaiveDateTime,
}

impl<R: ReferenceResolver> RecordTransformer<R> {
    /// `jnumber` is cited by every marker association; `load_date` stamps
    /// every row
    pub fn new(resolver: R, jnumber: impl Into<String>, load_date: NaiveDateTime) -> Self {
        Self {
            resolver,
            parser: AlleleInputParser::new(),
            jnumber: jnumber.into(),
            load_date,
        }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn into_resolver(self) -> R {
        self.resolver
    }

    pub fn load_date(&self) -> NaiveDateTime {
        self.load_date
    }

    /// Transform one raw line
    ///
    /// On rejection `keys` is left exactly as it was.
    pub async fn transform_line(
        &mut self,
        line: &str,
        line_num: usize,
        keys: &mut KeyState,
    ) -> Result<AlleleRecordSet, LineError> {
        let input = self.parser.parse_line(line, line_num)?;
        let resolved = self.resolve(input).await?;
        Ok(self.assemble(resolved, keys))
    }

    /// Resolve every field of a parsed line
    ///
    /// Each lookup is attempted even after an earlier one failed, so the
    /// rejection lists every bad field at once.
    pub async fn resolve(&mut self, input: AlleleInput) -> Result<ResolvedAllele, LineError> {
        let mut misses = Misses(Vec::new());
        let r = &mut self.resolver;

        let marker_key = misses.require(
            r.resolve_marker(&input.marker_id).await?,
            FieldCategory::Marker,
            &input.marker_id,
        );
        let allele_status_key = misses.require(
            r.resolve_term(Vocabulary::AlleleStatus, &input.status).await?,
            FieldCategory::Status,
            &input.status,
        );
        let allele_type_key = misses.require(
            r.resolve_term(Vocabulary::AlleleType, &input.allele_type).await?,
            FieldCategory::AlleleType,
            &input.allele_type,
        );
        let transmission_key = misses.require(
            r.resolve_term(Vocabulary::Transmission, &input.germline_transmission)
                .await?,
            FieldCategory::Germline,
            &input.germline_transmission,
        );
        let mode_key = misses.require(
            r.resolve_term(Vocabulary::InheritanceMode, &input.inheritance_mode)
                .await?,
            FieldCategory::InheritanceMode,
            &input.inheritance_mode,
        );
        let strain_key = misses.require(
            r.resolve_strain(&input.strain_of_origin).await?,
            FieldCategory::StrainOfOrigin,
            &input.strain_of_origin,
        );
        let refs_key = misses.require(
            r.resolve_reference(&self.jnumber).await?,
            FieldCategory::Reference,
            &self.jnumber,
        );
        let created_by_key = misses.require(
            r.resolve_user(&input.created_by).await?,
            FieldCategory::Creator,
            &input.created_by,
        );

        let mut mutation_keys = Vec::new();
        if !input.molecular_mutations.is_empty() {
            for term in input.molecular_mutations.split('|') {
                let key = r.resolve_term(Vocabulary::MolecularMutation, term).await?;
                mutation_keys.push(misses.require(key, FieldCategory::MolecularMutation, term));
            }
        }

        let mut references = Vec::new();
        if !input.references.is_empty() {
            for segment in input.references.split("||") {
                let Some((label, jnum)) = segment.split_once('|').filter(|(_, j)| !j.contains('|'))
                else {
                    misses.0.push(FieldError::new(FieldCategory::OtherReference, segment));
                    continue;
                };

                let role = ReferenceRole::parse(label);
                if role.is_none() {
                    misses.0.push(FieldError::new(FieldCategory::ReferenceRole, label));
                }
                let key = misses.require(
                    r.resolve_reference(jnum).await?,
                    FieldCategory::OtherReference,
                    jnum,
                );
                if let Some(role) = role {
                    references.push((role, key));
                }
            }
        }

        let is_mixed = misses.flag(&input.mixed, FieldCategory::Mixed);
        let is_extinct = misses.flag(&input.extinct, FieldCategory::Extinct);

        let mutant_cell_line_key = if input.mutant_cell_line.is_empty() {
            None
        } else {
            let key = r.resolve_mutant_cell_line(&input.mutant_cell_line).await?;
            if key.is_none() {
                warn!(
                    line = input.line_num,
                    cell_line = %input.mutant_cell_line,
                    "Mutant cell line not found, associating with key {}",
                    UNRESOLVED_CELL_LINE
                );
            }
            Some(key.unwrap_or(UNRESOLVED_CELL_LINE))
        };

        if !misses.0.is_empty() {
            return Err(LineError::Rejected(ValidationError::new(
                input.line_num,
                input.raw,
                misses.0,
            )));
        }

        Ok(ResolvedAllele {
            input,
            marker_key,
            allele_status_key,
            allele_type_key,
            transmission_key,
            mode_key,
            strain_key,
            refs_key,
            created_by_key,
            is_mixed,
            is_extinct,
            mutation_keys,
            references,
            mutant_cell_line_key,
        })
    }

    /// Build every row for a resolved line, drawing its keys
    pub fn assemble(&self, resolved: ResolvedAllele, keys: &mut KeyState) -> AlleleRecordSet {
        let date = self.load_date;
        let user = resolved.created_by_key;

        let accession_key = keys.next_key(KeySpace::Accession);
        let accession_number = keys.next_key(KeySpace::AccessionNumber);
        let marker_assoc_key = keys.next_key(KeySpace::MarkerAssoc);
        let allele_key = keys.next_key(KeySpace::Allele);

        let reference_assocs = resolved
            .references
            .iter()
            .map(|&(role, refs_key)| ReferenceAssocRow {
                assoc_key: keys.next_key(KeySpace::ReferenceAssoc),
                refs_key,
                object_key: allele_key,
                mgi_type_key: MGI_TYPE_ALLELE,
                ref_assoc_type_key: role.type_key(),
                created_by_key: user,
                modified_by_key: user,
                creation_date: date,
                modification_date: date,
            })
            .collect();

        let cell_line_assoc = resolved
            .mutant_cell_line_key
            .map(|mutant_cell_line_key| CellLineAssocRow {
                assoc_key: keys.next_key(KeySpace::CellLineAssoc),
                allele_key,
                mutant_cell_line_key,
                created_by_key: user,
                modified_by_key: user,
                creation_date: date,
                modification_date: date,
            });

        let input = &resolved.input;
        let mut notes = Vec::new();
        for (note_type, text) in [
            (NoteType::Molecular, &input.molecular_notes),
            (NoteType::Driver, &input.driver_notes),
            (NoteType::IkmcColony, &input.ikmc_colony_notes),
        ] {
            let chunks = chunk_note(text, NOTE_CHUNK_SIZE);
            if chunks.is_empty() {
                continue;
            }

            let note_key = keys.next_key(KeySpace::Note);
            notes.push(NoteRecord {
                note: NoteRow {
                    note_key,
                    object_key: allele_key,
                    mgi_type_key: MGI_TYPE_ALLELE,
                    note_type_key: note_type.type_key(),
                    created_by_key: user,
                    modified_by_key: user,
                    creation_date: date,
                    modification_date: date,
                },
                chunks: chunks
                    .into_iter()
                    .map(|chunk| NoteChunkRow {
                        note_key,
                        sequence_num: chunk.sequence_num,
                        note: chunk.text,
                        created_by_key: user,
                        modified_by_key: user,
                        creation_date: date,
                        modification_date: date,
                    })
                    .collect(),
            });
        }

        let acc_id = format!("{}{}", MGI_PREFIX, accession_number);

        AlleleRecordSet {
            allele: AlleleRow {
                allele_key,
                marker_key: resolved.marker_key,
                strain_key: resolved.strain_key,
                mode_key: resolved.mode_key,
                allele_type_key: resolved.allele_type_key,
                allele_status_key: resolved.allele_status_key,
                transmission_key: resolved.transmission_key,
                symbol: input.symbol.clone(),
                name: input.name.clone(),
                nomen_symbol: None,
                is_wild_type: 0,
                is_extinct: resolved.is_extinct,
                is_mixed: resolved.is_mixed,
                created_by_key: user,
                modified_by_key: user,
                approved_by_key: user,
                approval_date: date,
                creation_date: date,
                modification_date: date,
            },
            marker_assoc: MarkerAssocRow {
                assoc_key: marker_assoc_key,
                allele_key,
                marker_key: resolved.marker_key,
                qualifier_key: QUALIFIER_NOT_SPECIFIED,
                refs_key: resolved.refs_key,
                status_key: MARKER_STATUS_CURATED,
                created_by_key: user,
                modified_by_key: user,
                creation_date: date,
                modification_date: date,
            },
            mutations: resolved
                .mutation_keys
                .iter()
                .map(|&mutation_key| MutationRow {
                    allele_key,
                    mutation_key,
                    creation_date: date,
                    modification_date: date,
                })
                .collect(),
            reference_assocs,
            cell_line_assoc,
            notes,
            accession: AccessionRow {
                accession_key,
                acc_id: acc_id.clone(),
                prefix_part: MGI_PREFIX.to_string(),
                numeric_part: accession_number,
                logical_db_key: LOGICAL_DB_MGI,
                object_key: allele_key,
                mgi_type_key: MGI_TYPE_ALLELE,
                private: 0,
                preferred: 1,
                created_by_key: user,
                modified_by_key: user,
                creation_date: date,
                modification_date: date,
            },
            accession_references: Vec::new(),
            echo: EchoRow {
                raw: input.raw.clone(),
                acc_id,
            },
        }
    }
}
