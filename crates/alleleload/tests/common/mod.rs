//! Shared fixtures for allele load integration tests

#![allow(dead_code, clippy::unwrap_used)]

use alleleload::domain::Vocabulary;
use alleleload::keys::{initialize_keys, KeySpace, KeyState};
use alleleload::models::Table;
use alleleload::pipeline::{AlleleLoadPipeline, LoadStats};
use alleleload::resolver::InMemoryResolver;
use alleleload::sink::{BcpFileSink, OutputPaths};
use alleleload::transformer::RecordTransformer;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::Path;

pub const LOAD_DATE: &str = "2024-03-01T09:30:00";

pub const SCENARIO_LINE: &str = "MGI:001\tSym<tm1>\tsome gene\tApproved\tTargeted\t\t\tGermline\tOriginal|J:5000\tC57BL/6J\tES123\tSome molecular note text\t\t\tInsertion\tNot Applicable\t0\t0\tjdoe";

pub fn load_date() -> NaiveDateTime {
    NaiveDateTime::parse_from_str(LOAD_DATE, "%Y-%m-%dT%H:%M:%S").unwrap()
}

/// Reference data every fixture line resolves against
pub fn resolver() -> InMemoryResolver {
    InMemoryResolver::new()
        .with_marker("MGI:001", 10)
        .with_marker("MGI:002", 20)
        .with_term(Vocabulary::AlleleStatus, "Approved", 847114)
        .with_term(Vocabulary::AlleleType, "Targeted", 847116)
        .with_term(Vocabulary::Transmission, "Germline", 3982951)
        .with_term(Vocabulary::InheritanceMode, "Not Applicable", 982)
        .with_term(Vocabulary::MolecularMutation, "Insertion", 847131)
        .with_term(Vocabulary::MolecularMutation, "Deletion", 847130)
        .with_strain("C57BL/6J", 40)
        .with_user("jdoe", 1001)
        .with_reference("J:136110", 136)
        .with_reference("J:1000", 100)
        .with_reference("J:2000", 200)
        .with_reference("J:5000", 500)
        .with_mutant_cell_line("ES123", 77)
}

/// Persisted key maxima before the run
pub fn key_maxima() -> HashMap<KeySpace, i64> {
    HashMap::from([
        (KeySpace::Allele, 1000),
        (KeySpace::MarkerAssoc, 2000),
        (KeySpace::ReferenceAssoc, 3000),
        (KeySpace::Accession, 4000),
        (KeySpace::Note, 5000),
        (KeySpace::CellLineAssoc, 6000),
        (KeySpace::AccessionNumber, 7000),
    ])
}

/// Replace field `index` of the scenario line
pub fn scenario_with(changes: &[(usize, &str)]) -> String {
    let mut fields: Vec<String> = SCENARIO_LINE.split('\t').map(str::to_string).collect();
    for &(index, value) in changes {
        fields[index] = value.to_string();
    }
    fields.join("\t")
}

pub struct LoadOutcome {
    pub stats: LoadStats,
    pub paths: OutputPaths,
    pub keys: KeyState,
}

/// Run the full pipeline over `input` into `dir`
pub async fn run_load(input: &str, dir: &Path) -> LoadOutcome {
    run_load_bytes(input.as_bytes(), dir).await
}

/// Run the full pipeline over raw input bytes
pub async fn run_load_bytes(input: &[u8], dir: &Path) -> LoadOutcome {
    let keys = initialize_keys(&mut key_maxima()).await.unwrap();
    let paths = OutputPaths::for_input(dir, "alleles.txt");
    let sink = BcpFileSink::create(paths.clone()).unwrap();
    let transformer = RecordTransformer::new(resolver(), "J:136110", load_date());

    let mut pipeline = AlleleLoadPipeline::new(transformer, sink, keys);
    let stats = pipeline.run(input).await.unwrap();

    LoadOutcome {
        stats,
        paths,
        keys: pipeline.keys().clone(),
    }
}

/// Rows of a bcp file, split into fields
pub fn read_rows(paths: &OutputPaths, table: Table) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .from_path(paths.table(table))
        .unwrap();

    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

/// Build an expected row from display values
pub fn row(fields: &[&dyn std::fmt::Display]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}
