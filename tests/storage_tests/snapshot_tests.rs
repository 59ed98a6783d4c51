//! Tests for snapshot files
//!
//! These tests verify:
//! - Writing and loading snapshots
//! - Header fields (count, next id)
//! - Ordering enforcement
//! - Corruption detection (magic, header and data CRCs, truncation)
//! - Atomic replacement of an existing snapshot

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use gamevault::storage::{SnapshotReader, SnapshotWriter};
use gamevault::{CatalogError, Record};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_snapshot() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.snap");
    (temp_dir, path)
}

fn sample() -> BTreeMap<u64, Record> {
    let mut records = BTreeMap::new();
    records.insert(1, Record::new("Zelda", "E", "Medium", 50.0, "Switch", 59.99));
    records.insert(4, Record::new("Halo", "M", "Hard", 12.0, "Xbox", 39.99));
    records.insert(9, Record::new("Celeste", "E", "Hard", 8.5, "PC", 19.99));
    records
}

fn write_sample(path: &PathBuf) {
    let records = sample();
    SnapshotWriter::write_all(path, 10, records.iter().map(|(id, r)| (*id, r))).unwrap();
}

// =============================================================================
// Write/Load Tests
// =============================================================================

#[test]
fn test_write_and_load() {
    let (_temp, path) = setup_temp_snapshot();
    let records = sample();

    let info =
        SnapshotWriter::write_all(&path, 10, records.iter().map(|(id, r)| (*id, r))).unwrap();

    assert_eq!(info.entry_count, 3);
    assert_eq!(info.next_id, 10);
    assert_eq!(info.file_size, fs::metadata(&path).unwrap().len());

    let snapshot = SnapshotReader::load(&path).unwrap();
    assert_eq!(snapshot.next_id, 10);
    assert_eq!(snapshot.records, records);
}

#[test]
fn test_empty_snapshot() {
    let (_temp, path) = setup_temp_snapshot();

    let info = SnapshotWriter::new(&path, 1).unwrap().finish().unwrap();
    assert_eq!(info.entry_count, 0);

    let snapshot = SnapshotReader::load(&path).unwrap();
    assert!(snapshot.records.is_empty());
    assert_eq!(snapshot.next_id, 1);
}

#[test]
fn test_ids_must_ascend() {
    let (_temp, path) = setup_temp_snapshot();
    let record = Record::new("a", "E", "Easy", 1.0, "PC", 1.0);

    let mut writer = SnapshotWriter::new(&path, 5).unwrap();
    writer.add(3, &record).unwrap();

    assert!(matches!(writer.add(3, &record), Err(CatalogError::Storage(_))));
    assert!(matches!(writer.add(2, &record), Err(CatalogError::Storage(_))));
}

#[test]
fn test_unfinished_writer_leaves_no_file() {
    let (_temp, path) = setup_temp_snapshot();

    {
        let mut writer = SnapshotWriter::new(&path, 2).unwrap();
        writer
            .add(1, &Record::new("a", "E", "Easy", 1.0, "PC", 1.0))
            .unwrap();
    }

    assert!(!path.exists());
}

#[test]
fn test_rewrite_replaces_previous() {
    let (_temp, path) = setup_temp_snapshot();
    write_sample(&path);

    let record = Record::new("Only", "T", "Easy", 1.0, "PS5", 9.0);
    SnapshotWriter::write_all(&path, 42, [(41, &record)]).unwrap();

    let snapshot = SnapshotReader::load(&path).unwrap();
    assert_eq!(snapshot.records.len(), 1);
    assert_eq!(snapshot.records[&41], record);
    assert_eq!(snapshot.next_id, 42);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_bad_magic_rejected() {
    let (_temp, path) = setup_temp_snapshot();
    write_sample(&path);

    let mut bytes = fs::read(&path).unwrap();
    bytes[0] = b'X';

    assert!(matches!(
        SnapshotReader::decode(&bytes),
        Err(CatalogError::SnapshotCorruption(_))
    ));
}

#[test]
fn test_flipped_data_byte_rejected() {
    let (_temp, path) = setup_temp_snapshot();
    write_sample(&path);

    let mut bytes = fs::read(&path).unwrap();
    bytes[30] ^= 0xFF;

    assert!(matches!(
        SnapshotReader::decode(&bytes),
        Err(CatalogError::SnapshotCorruption(_))
    ));
}

#[test]
fn test_flipped_next_id_rejected() {
    let (_temp, path) = setup_temp_snapshot();
    write_sample(&path);

    // Low byte of next_id: 10 would read back as 2 and let ids be reused
    let mut bytes = fs::read(&path).unwrap();
    bytes[14] ^= 0x08;

    assert!(matches!(
        SnapshotReader::decode(&bytes),
        Err(CatalogError::SnapshotCorruption(_))
    ));
}

#[test]
fn test_flipped_count_rejected() {
    let (_temp, path) = setup_temp_snapshot();
    write_sample(&path);

    let mut bytes = fs::read(&path).unwrap();
    bytes[13] ^= 0x01;

    assert!(matches!(
        SnapshotReader::decode(&bytes),
        Err(CatalogError::SnapshotCorruption(_))
    ));
}

#[test]
fn test_truncated_file_rejected() {
    let (_temp, path) = setup_temp_snapshot();
    write_sample(&path);

    let bytes = fs::read(&path).unwrap();
    assert!(SnapshotReader::decode(&bytes[..bytes.len() - 3]).is_err());
    assert!(SnapshotReader::decode(&bytes[..10]).is_err());
}
