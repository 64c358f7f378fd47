//! Integration tests for the analyzer pipeline against demo and on-disk kstats

use super::{Config, Severity, analyze_into, load};
use crate::display::Terminal;
use crate::error::DiagError;
use crate::system::{DemoFilesystemReader, RealFilesystemReader};
use std::fs;

fn demo_config() -> Config {
    Config {
        kstat_dir: "/proc/spl/kstat/zfs".to_string(),
    }
}

#[test]
fn test_demo_snapshot_loads_every_section() {
    let snapshot = load(&DemoFilesystemReader, "/proc/spl/kstat/zfs").unwrap();
    assert_eq!(snapshot.arc.hits, 98_417_093);
    assert!(snapshot.arc.l2.is_present());
    assert_eq!(snapshot.prefetch.as_ref().unwrap().max_streams, 5_120_349);
    assert_eq!(snapshot.tx.as_ref().unwrap().dirty_delay, 1293);
}

#[test]
fn test_demo_findings() {
    let mut out = Vec::new();
    let findings = analyze_into(
        &demo_config(),
        &DemoFilesystemReader,
        &Terminal::plain(),
        &mut out,
    )
    .unwrap();

    let subjects: Vec<(&str, Severity)> =
        findings.iter().map(|f| (f.subject, f.severity)).collect();
    assert_eq!(
        subjects,
        vec![
            ("ARC", Severity::Ok),
            ("L2ARC", Severity::Notice),
            ("prefetch", Severity::Notice),
            ("txg", Severity::Notice),
        ]
    );

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("[ OK ] ARC: hit ratio 95.7% is excellent"));
    assert!(text.contains("L2ARC (Level 2 ARC)"));
    assert!(text.contains("  Size              43.1G/46.5G (92.8% of c_max)"));
    assert!(!text.contains("Nothing needs attention"));
}

#[test]
fn test_optional_files_may_be_missing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("arcstats"),
        "13 1 0x01 4 192 10 20\nname type data\nhits 4 10\nmisses 4 90\nsize 4 100\nc_max 4 1000\n",
    )
    .unwrap();
    let config = Config {
        kstat_dir: dir.path().to_str().unwrap().to_string(),
    };

    let mut out = Vec::new();
    let findings = analyze_into(&config, &RealFilesystemReader, &Terminal::plain(), &mut out).unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Warning);
    let text = String::from_utf8(out).unwrap();
    assert!(!text.contains("Prefetcher"));
    assert!(!text.contains("Transactions"));
}

#[test]
fn test_missing_arcstats_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        kstat_dir: dir.path().to_str().unwrap().to_string(),
    };
    let mut out = Vec::new();

    let result = analyze_into(&config, &RealFilesystemReader, &Terminal::plain(), &mut out);

    assert!(matches!(result, Err(DiagError::Filesystem { .. })));
    assert!(out.is_empty());
}

#[test]
fn test_malformed_optional_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("arcstats"),
        "13 1 0x01 4 192 10 20\nname type data\nhits 4 10\nmisses 4 90\nsize 4 100\nc_max 4 1000\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("zfetchstats"),
        "5 1 0x01 1 48 10 20\nname type data\nhits 4 many\n",
    )
    .unwrap();
    let config = Config {
        kstat_dir: dir.path().to_str().unwrap().to_string(),
    };

    let result = analyze_into(&config, &RealFilesystemReader, &Terminal::plain(), &mut Vec::new());

    assert!(matches!(result, Err(DiagError::Parse { .. })));
}
