//! Tests for WAL Writer
//!
//! These tests verify:
//! - Writing commit frames to the WAL
//! - LSN generation and sequencing
//! - Reopening an existing WAL
//! - Truncation
//! - Integration with reader

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use gamevault::wal::{CommitBatch, Mutation, WalReader, WalWriter};
use gamevault::{CatalogError, Record};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn put(id: u64, name: &str) -> CommitBatch {
    CommitBatch {
        mutations: vec![Mutation::Put {
            id,
            record: Record::new(name, "E", "Easy", 1.0, "PC", 9.99),
        }],
        next_id: id + 1,
    }
}

fn delete(id: u64, next_id: u64) -> CommitBatch {
    CommitBatch {
        mutations: vec![Mutation::Delete { id }],
        next_id,
    }
}

// =============================================================================
// Basic Writing Tests
// =============================================================================

#[test]
fn test_open_creates_file() {
    let (_temp, wal_path) = setup_temp_wal();

    let writer = WalWriter::open(&wal_path).unwrap();

    assert!(wal_path.exists());
    assert!(writer.is_empty());
    assert_eq!(writer.current_lsn(), 1);
}

#[test]
fn test_write_single_entry() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path).unwrap();
    let lsn = writer.append(put(1, "Zelda")).unwrap();

    assert_eq!(lsn, 1);
    assert_eq!(writer.current_lsn(), 2);
    assert_eq!(writer.len(), std::fs::metadata(&wal_path).unwrap().len());
}

#[test]
fn test_write_multiple_entries() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path).unwrap();

    let lsn1 = writer.append(put(1, "a")).unwrap();
    let lsn2 = writer.append(put(2, "b")).unwrap();
    let lsn3 = writer.append(delete(1, 3)).unwrap();

    assert_eq!(lsn1, 1);
    assert_eq!(lsn2, 2);
    assert_eq!(lsn3, 3);
    assert_eq!(writer.current_lsn(), 4);
}

#[test]
fn test_lsn_sequential() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path).unwrap();

    let lsns: Vec<u64> = (1..=100)
        .map(|id| writer.append(put(id, &format!("game{}", id))).unwrap())
        .collect();

    for (i, lsn) in lsns.iter().enumerate() {
        assert_eq!(*lsn, (i + 1) as u64);
    }
}

// =============================================================================
// Reopen Tests
// =============================================================================

#[test]
fn test_reopen_continues_lsn() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path).unwrap();
        writer.append(put(1, "a")).unwrap();
        writer.append(put(2, "b")).unwrap();
    }

    let mut writer = WalWriter::open(&wal_path).unwrap();
    assert_eq!(writer.current_lsn(), 3);
    assert_eq!(writer.append(put(3, "c")).unwrap(), 3);
}

#[test]
fn test_open_rejects_damaged_tail() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path).unwrap();
        writer.append(put(1, "a")).unwrap();
    }
    let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&[0xAB; 5]).unwrap();

    let result = WalWriter::open(&wal_path);
    assert!(matches!(result, Err(CatalogError::WalCorruption(_))));
}

// =============================================================================
// Write + Read Integration Tests
// =============================================================================

#[test]
fn test_write_then_read() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path).unwrap();
        writer.append(put(1, "key1")).unwrap();
        writer.append(put(2, "key2")).unwrap();
        writer.append(delete(1, 3)).unwrap();
    } // Writer dropped, file closed

    let mut reader = WalReader::open(&wal_path).unwrap();

    let entry1 = reader.next_entry().unwrap().unwrap();
    assert_eq!(entry1.lsn, 1);
    assert!(matches!(entry1.commit.mutations[0], Mutation::Put { id: 1, .. }));

    let entry2 = reader.next_entry().unwrap().unwrap();
    assert_eq!(entry2.lsn, 2);

    let entry3 = reader.next_entry().unwrap().unwrap();
    assert_eq!(entry3.lsn, 3);
    assert_eq!(entry3.commit.mutations[0], Mutation::Delete { id: 1 });
    assert_eq!(entry3.commit.next_id, 3);

    // EOF
    assert!(reader.next_entry().unwrap().is_none());
}

// =============================================================================
// Truncate Tests
// =============================================================================

#[test]
fn test_truncate_resets_lsn() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path).unwrap();
    writer.append(put(1, "a")).unwrap();
    writer.append(put(2, "b")).unwrap();
    assert_eq!(writer.current_lsn(), 3);

    writer.truncate().unwrap();
    assert_eq!(writer.current_lsn(), 1);
    assert!(writer.is_empty());
    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), 0);

    // New writes start from LSN 1
    assert_eq!(writer.append(put(3, "c")).unwrap(), 1);
}
