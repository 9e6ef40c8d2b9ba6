//! End-to-end tests for converter runs
//!
//! These tests drive whole runs through files on disk:
//! - Plain and gzip inputs through `run_file`
//! - JSON-lines output with resolvable references
//! - Run reports written by the command-line entry point
//! - Fatal and skippable data errors

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bioconv_common::checksum::file_sha256;
use bioconv_common::{ConvertError, Item, ItemRef};
use bioconv_ingest::cli::{run_cli, Cli};
use bioconv_ingest::converters::{AtcConverter, CcsbConverter, HtridbConverter};
use bioconv_ingest::framework::{run_file, JsonLinesSink, MemorySink, RunReport};
use clap::Parser;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const ATC_CODES: &str = "A01AB Antiinfectives for local oral treatment\n\
                         A01A STOMATOLOGICAL PREPARATIONS\n\
                         A01 STOMATOLOGICAL PREPARATIONS\n\
                         A ALIMENTARY TRACT AND METABOLISM\n\
                         B BLOOD AND BLOOD FORMING ORGANS\n";

const CCSB_PAIRS: &str = "entrez_a\tsymbol_a\tentrez_b\tsymbol_b\n\
                          7157\tTP53\t672\tBRCA1\n\
                          672\tBRCA1\t7157\tTP53\n\
                          1017\tCDK2\t1017\tCDK2\n";

/// Helper to write a fixture file
fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Helper to write a gzip-compressed fixture file
fn write_gz(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

fn read_items(path: &Path) -> Vec<Item> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// Every reference and collection entry must name an emitted item
fn assert_no_dangling_references(items: &[Item]) {
    let ids: HashSet<&ItemRef> = items.iter().map(|item| &item.identifier).collect();
    assert_eq!(ids.len(), items.len(), "identifiers must be unique");

    for item in items {
        for target in item.references.values() {
            assert!(ids.contains(target), "{} references missing {}", item.identifier, target);
        }
        for target in item.collections.values().flatten() {
            assert!(ids.contains(target), "{} collects missing {}", item.identifier, target);
        }
    }
}

// ============================================================================
// run_file Tests
// ============================================================================

#[test]
fn test_gzip_input_matches_plain_input() {
    let dir = TempDir::new().unwrap();
    let plain = write_file(&dir, "atc.txt", ATC_CODES);
    let gzipped = write_gz(&dir, "atc.txt.gz", ATC_CODES);

    let mut plain_sink = MemorySink::new();
    let plain_report = run_file(&mut AtcConverter::new(), &plain, &mut plain_sink).unwrap();
    let mut gz_sink = MemorySink::new();
    let gz_report = run_file(&mut AtcConverter::new(), &gzipped, &mut gz_sink).unwrap();

    assert_eq!(plain_sink.items(), gz_sink.items());
    assert_eq!(plain_report.items_by_class, gz_report.items_by_class);
    assert_ne!(plain_report.input_sha256, gz_report.input_sha256);
    assert_eq!(plain_report.input_sha256, Some(file_sha256(&plain).unwrap()));
    assert!(gz_sink.is_finished());
}

#[test]
fn test_hierarchy_parents_are_emitted_first() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "atc.txt", ATC_CODES);
    let output = dir.path().join("items.jsonl");

    let mut sink = JsonLinesSink::new(std::fs::File::create(&output).unwrap());
    let report = run_file(&mut AtcConverter::new(), &input, &mut sink).unwrap();
    drop(sink);

    let items = read_items(&output);
    assert_eq!(items.len(), 5);
    assert_eq!(report.items_by_class.get("AtcClassification"), Some(&5));
    assert_no_dangling_references(&items);

    let mut seen = HashSet::new();
    for item in &items {
        if let Some(parent) = item.reference("parent") {
            assert!(seen.contains(parent), "{:?} emitted before its parent", item.attribute("atcCode"));
        }
        seen.insert(item.identifier.clone());
    }
}

#[test]
fn test_interaction_output_is_deduplicated() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "ccsb.tsv", CCSB_PAIRS);
    let output = dir.path().join("items.jsonl");

    let mut sink = JsonLinesSink::new(std::fs::File::create(&output).unwrap());
    let report = run_file(&mut CcsbConverter::new(Default::default()), &input, &mut sink).unwrap();
    drop(sink);

    assert_eq!(report.rows_read, 3);
    let items = read_items(&output);
    assert_no_dangling_references(&items);

    let count = |class: &str| items.iter().filter(|item| item.is_class(class)).count();
    assert_eq!(count("Gene"), 3);
    // TP53/BRCA1 both ways plus the CDK2 self pair
    assert_eq!(count("Interaction"), 3);
    assert_eq!(count("InteractionDetail"), 3);
    assert_eq!(count("Organism"), 1);
    assert_eq!(count("DataSet"), 1);
    assert_eq!(count("DataSource"), 1);
}

#[test]
fn test_regulation_experiments_survive_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        &dir,
        "htridb.csv",
        "#;TF_GENE_ID;TF_SYMBOL;TARGET_GENE_ID;TARGET_SYMBOL;TECHNIQUE;PUBMED_ID\n\
         1;G1;A;G2;B;ChIP;PMID1\n\
         2;G1;A;G2;B;ChIP;PMID2\n",
    );
    let output = dir.path().join("items.jsonl");

    let mut sink = JsonLinesSink::new(std::fs::File::create(&output).unwrap());
    run_file(&mut HtridbConverter::new(), &input, &mut sink).unwrap();
    drop(sink);

    let items = read_items(&output);
    assert_no_dangling_references(&items);
    let regulations: Vec<_> = items
        .iter()
        .filter(|item| item.is_class("TranscriptionalRegulation"))
        .collect();
    assert_eq!(regulations.len(), 1);
    assert_eq!(regulations[0].collection("experiments").len(), 2);
}

#[test]
fn test_missing_input_is_io_error() {
    let mut sink = MemorySink::new();
    let err = run_file(&mut AtcConverter::new(), "/no/such/atc.txt", &mut sink).unwrap_err();
    assert!(matches!(err, ConvertError::Io(_)));
    assert!(!sink.is_finished());
}

// ============================================================================
// Command-line Tests
// ============================================================================

#[tokio::test]
async fn test_cli_writes_items_and_report() {
    let dir = TempDir::new().unwrap();
    let input = write_gz(&dir, "atc.txt.gz", ATC_CODES);
    let config = write_file(&dir, "bioconv.toml", "[defaults]\nmalformed_rows = \"skip\"\n");
    let output = dir.path().join("items.jsonl");
    let report_path = dir.path().join("report.json");

    let cli = Cli::try_parse_from([
        "bioconv",
        "atc",
        "--input",
        input.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--report",
        report_path.to_str().unwrap(),
    ])
    .unwrap();

    let report = run_cli(&cli).await.unwrap();
    assert_eq!(report.converter, "atc");
    assert_eq!(report.total_items(), 5);

    let items = read_items(&output);
    assert_eq!(items.len(), 5);

    let written: RunReport = serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written.items_by_class, report.items_by_class);
    assert_eq!(written.input_sha256, Some(file_sha256(&input).unwrap()));
}

#[tokio::test]
async fn test_cli_fails_on_unresolved_parent() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "atc.txt", "A alimentary\nB01 antithrombotic agents\n");
    let config = write_file(&dir, "bioconv.toml", "");
    let output = dir.path().join("items.jsonl");

    let cli = Cli::try_parse_from([
        "bioconv",
        "atc",
        "-i",
        input.to_str().unwrap(),
        "-c",
        config.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ])
    .unwrap();

    let err = run_cli(&cli).await.unwrap_err();
    let cause = err.downcast_ref::<ConvertError>().unwrap();
    assert!(matches!(cause, ConvertError::UnresolvedParent { .. }));
}

#[tokio::test]
async fn test_cli_reports_missing_lookup_table() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "mirtarbase.tsv", "header\n");
    let config = write_file(&dir, "bioconv.toml", "");

    let cli = Cli::try_parse_from([
        "bioconv",
        "mirtarbase",
        "-i",
        input.to_str().unwrap(),
        "-c",
        config.to_str().unwrap(),
    ])
    .unwrap();

    let err = run_cli(&cli).await.unwrap_err();
    let cause = err.downcast_ref::<ConvertError>().unwrap();
    assert!(matches!(cause, ConvertError::MissingOption("mirtarbase.mirna_map")));
}
