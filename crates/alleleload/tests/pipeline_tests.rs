//! End-to-end tests for the allele load pipeline

#![allow(clippy::unwrap_used)]

mod common;

use alleleload::keys::KeySpace;
use alleleload::models::Table;
use common::*;
use std::fs;
use tempfile::TempDir;

// ============================================================================
// Scenario
// ============================================================================

#[tokio::test]
async fn test_end_to_end_scenario() {
    let dir = TempDir::new().unwrap();
    let out = run_load(&format!("{SCENARIO_LINE}\n"), dir.path()).await;
    let d = LOAD_DATE;

    assert_eq!(out.stats.accepted, 1);
    assert_eq!(out.stats.rejected, 0);

    assert_eq!(
        read_rows(&out.paths, Table::Allele),
        vec![row(&[
            &1001, &10, &40, &982, &847116, &847114, &3982951, &"Sym<tm1>", &"some gene", &"",
            &0, &0, &0, &1001, &1001, &1001, &d, &d, &d,
        ])]
    );
    assert_eq!(
        read_rows(&out.paths, Table::MarkerAssoc),
        vec![row(&[&2001, &1001, &10, &4268547, &136, &4268545, &1001, &1001, &d, &d])]
    );
    assert_eq!(
        read_rows(&out.paths, Table::Mutation),
        vec![row(&[&1001, &847131, &d, &d])]
    );
    assert_eq!(
        read_rows(&out.paths, Table::ReferenceAssoc),
        vec![row(&[&3001, &500, &1001, &11, &1011, &1001, &1001, &d, &d])]
    );
    assert_eq!(
        read_rows(&out.paths, Table::CellLine),
        vec![row(&[&6001, &1001, &77, &1001, &1001, &d, &d])]
    );
    assert_eq!(
        read_rows(&out.paths, Table::Note),
        vec![row(&[&5001, &1001, &11, &1021, &1001, &1001, &d, &d])]
    );
    assert_eq!(
        read_rows(&out.paths, Table::NoteChunk),
        vec![row(&[&5001, &1, &"Some molecular note text", &1001, &1001, &d, &d])]
    );
    assert_eq!(
        read_rows(&out.paths, Table::Accession),
        vec![row(&[
            &4001, &"MGI:7001", &"MGI:", &7001, &1, &1001, &11, &0, &1, &1001, &1001, &d, &d,
        ])]
    );
    assert!(read_rows(&out.paths, Table::AccessionReference).is_empty());

    let echo = fs::read_to_string(out.paths.echo()).unwrap();
    assert_eq!(echo, format!("{SCENARIO_LINE}\tMGI:7001\n"));
}

// ============================================================================
// Key assignment
// ============================================================================

#[tokio::test]
async fn test_allele_keys_are_consecutive() {
    let dir = TempDir::new().unwrap();
    let input: String = (1..=5)
        .map(|i| scenario_with(&[(1, &format!("Sym<tm{i}>"))]) + "\n")
        .collect();
    let out = run_load(&input, dir.path()).await;

    assert_eq!(out.stats.accepted, 5);

    let allele_keys: Vec<String> = read_rows(&out.paths, Table::Allele)
        .into_iter()
        .map(|r| r[0].clone())
        .collect();
    assert_eq!(allele_keys, vec!["1001", "1002", "1003", "1004", "1005"]);

    let acc_ids: Vec<String> = read_rows(&out.paths, Table::Accession)
        .into_iter()
        .map(|r| r[1].clone())
        .collect();
    assert_eq!(
        acc_ids,
        vec!["MGI:7001", "MGI:7002", "MGI:7003", "MGI:7004", "MGI:7005"]
    );

    assert_eq!(out.keys.peek(KeySpace::Allele), 1006);
    assert_eq!(out.keys.peek(KeySpace::AccessionNumber), 7006);
    assert_eq!(out.keys.peek(KeySpace::Note), 5006);
}

#[tokio::test]
async fn test_reference_assoc_keys_increment_across_lines() {
    let dir = TempDir::new().unwrap();
    let refs = scenario_with(&[(8, "Original|J:1000||Molecular|J:2000")]);
    let input = format!("{refs}\n{refs}\n");
    let out = run_load(&input, dir.path()).await;

    let rows: Vec<(String, String, String)> = read_rows(&out.paths, Table::ReferenceAssoc)
        .into_iter()
        .map(|r| (r[0].clone(), r[2].clone(), r[4].clone()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("3001".into(), "1001".into(), "1011".into()),
            ("3002".into(), "1001".into(), "1012".into()),
            ("3003".into(), "1002".into(), "1011".into()),
            ("3004".into(), "1002".into(), "1012".into()),
        ]
    );
}

// ============================================================================
// Rejections
// ============================================================================

#[tokio::test]
async fn test_rejected_line_leaves_no_rows_and_no_gaps() {
    let dir = TempDir::new().unwrap();
    let bad = scenario_with(&[(0, "MGI:999"), (1, "Bad<tm1>"), (18, "nobody")]);
    let good = scenario_with(&[(0, "MGI:002"), (1, "Good<tm2>")]);
    let input = format!("{SCENARIO_LINE}\n{bad}\n{good}\n");
    let out = run_load(&input, dir.path()).await;

    assert_eq!(out.stats.accepted, 2);
    assert_eq!(out.stats.rejected, 1);

    let alleles = read_rows(&out.paths, Table::Allele);
    let symbols: Vec<&str> = alleles.iter().map(|r| r[7].as_str()).collect();
    assert_eq!(symbols, vec!["Sym<tm1>", "Good<tm2>"]);
    let keys: Vec<&str> = alleles.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(keys, vec!["1001", "1002"]);

    for table in Table::ALL {
        let rows = read_rows(&out.paths, table);
        assert_eq!(rows.len(), out.stats.rows(table), "{} row count", table);
        assert!(
            rows.iter().flatten().all(|f| f != "1003"),
            "{} references a key beyond the accepted lines",
            table
        );
    }

    let echo = fs::read_to_string(out.paths.echo()).unwrap();
    assert_eq!(echo.lines().count(), 2);
    assert!(!echo.contains("Bad<tm1>"));

    let errors = fs::read_to_string(out.paths.error()).unwrap();
    assert!(errors.contains("Invalid Marker (2): MGI:999"));
    assert!(errors.contains("Invalid Creator (2): nobody"));
}

#[tokio::test]
async fn test_invalid_and_blank_lines() {
    let dir = TempDir::new().unwrap();
    let input = format!("{SCENARIO_LINE}\nMGI:001\tTooShort\n\n{SCENARIO_LINE}\r\n");
    let out = run_load(&input, dir.path()).await;

    assert_eq!(out.stats.lines_read, 4);
    assert_eq!(out.stats.blank, 1);
    assert_eq!(out.stats.accepted, 2);
    assert_eq!(out.stats.rejected, 1);

    let errors = fs::read_to_string(out.paths.error()).unwrap();
    assert!(errors.contains("Invalid Line (2)"));
    assert!(errors.contains("\tMGI:001\tTooShort\n"));
}

#[tokio::test]
async fn test_non_utf8_line_is_rejected_and_load_continues() {
    let dir = TempDir::new().unwrap();
    // Latin-1 e-acute in the molecular note
    let latin1: Vec<u8> = scenario_with(&[(1, "Latin<tm1>"), (11, "Caf@")])
        .into_bytes()
        .into_iter()
        .map(|b| if b == b'@' { 0xE9 } else { b })
        .collect();

    let mut input = format!("{SCENARIO_LINE}\n").into_bytes();
    input.extend_from_slice(&latin1);
    input.push(b'\n');
    input.extend_from_slice(scenario_with(&[(1, "Sym<tm2>")]).as_bytes());
    input.push(b'\n');

    let out = run_load_bytes(&input, dir.path()).await;

    assert_eq!(out.stats.lines_read, 3);
    assert_eq!(out.stats.accepted, 2);
    assert_eq!(out.stats.rejected, 1);

    let symbols: Vec<String> = read_rows(&out.paths, Table::Allele)
        .into_iter()
        .map(|r| r[7].clone())
        .collect();
    assert_eq!(symbols, vec!["Sym<tm1>", "Sym<tm2>"]);

    let errors = fs::read_to_string(out.paths.error()).unwrap();
    assert!(errors.contains("Invalid Line (2): invalid UTF-8"));
    assert!(errors.contains("Latin<tm1>"));
    assert!(errors.contains("End Date/Time"));
}

#[tokio::test]
async fn test_tab_only_line_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = format!("{SCENARIO_LINE}\n\t\t\t\n");
    let out = run_load(&input, dir.path()).await;

    assert_eq!(out.stats.blank, 0);
    assert_eq!(out.stats.accepted, 1);
    assert_eq!(out.stats.rejected, 1);

    let errors = fs::read_to_string(out.paths.error()).unwrap();
    assert!(errors.contains("Invalid Line (2)"));
}

#[tokio::test]
async fn test_unresolved_cell_line_is_loaded_with_zero_key() {
    let dir = TempDir::new().unwrap();
    let line = scenario_with(&[(10, "UNKNOWN-ES")]);
    let out = run_load(&format!("{line}\n"), dir.path()).await;

    assert_eq!(out.stats.accepted, 1);
    let rows = read_rows(&out.paths, Table::CellLine);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][2], "0");
}

// ============================================================================
// Notes
// ============================================================================

#[tokio::test]
async fn test_long_molecular_note_is_chunked() {
    let dir = TempDir::new().unwrap();
    let note: String = "ACGT".repeat(150);
    let line = scenario_with(&[(11, &note)]);
    let out = run_load(&format!("{line}\n"), dir.path()).await;

    let chunks = read_rows(&out.paths, Table::NoteChunk);
    let shape: Vec<(String, usize)> = chunks
        .iter()
        .map(|r| (r[1].clone(), r[2].chars().count()))
        .collect();
    assert_eq!(
        shape,
        vec![("1".into(), 255), ("2".into(), 255), ("3".into(), 90)]
    );

    let joined: String = chunks.iter().map(|r| r[2].as_str()).collect();
    assert_eq!(joined, note);
    assert_eq!(read_rows(&out.paths, Table::Note).len(), 1);
}

#[tokio::test]
async fn test_all_three_notes_are_written() {
    let dir = TempDir::new().unwrap();
    let line = scenario_with(&[(12, "Cre driver"), (13, "Colony EPD0001")]);
    let out = run_load(&format!("{line}\n"), dir.path()).await;

    let notes: Vec<(String, String)> = read_rows(&out.paths, Table::Note)
        .into_iter()
        .map(|r| (r[0].clone(), r[3].clone()))
        .collect();
    assert_eq!(
        notes,
        vec![
            ("5001".into(), "1021".into()),
            ("5002".into(), "1034".into()),
            ("5003".into(), "1041".into()),
        ]
    );
    assert_eq!(read_rows(&out.paths, Table::NoteChunk).len(), 3);
}
