//! Tests for OrderedStore and TransactionManager
//!
//! These tests verify:
//! - Opening/creating storage directories and first-run detection
//! - Staged mutations stay invisible until commit
//! - Commit, abort and checkpoint behavior
//! - Persistence across reopen (snapshot + WAL replay)

use std::path::PathBuf;

use gamevault::storage::OrderedStore;
use gamevault::transaction::TransactionManager;
use gamevault::{CatalogError, Record};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_storage() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog");
    (temp_dir, path)
}

fn open(path: &PathBuf, checkpoint_every: u64) -> (OrderedStore, TransactionManager) {
    let mut store = OrderedStore::open(path).unwrap();
    let txn = TransactionManager::open(&mut store, checkpoint_every).unwrap();
    (store, txn)
}

fn record(name: &str) -> Record {
    Record::new(name, "E", "Easy", 10.0, "PC", 14.99)
}

fn insert(store: &mut OrderedStore, txn: &mut TransactionManager, name: &str) -> u64 {
    let id = store.allocate_id();
    store.put(id, record(name));
    txn.commit(store).unwrap();
    id
}

// =============================================================================
// Open/Create Tests
// =============================================================================

#[test]
fn test_open_creates_directory_and_marks_first_run() {
    let (_temp, path) = setup_temp_storage();
    assert!(!path.exists());

    let (store, _txn) = open(&path, 10);

    assert!(path.is_dir());
    assert!(path.join(OrderedStore::WAL_FILENAME).exists());
    assert!(store.is_first_run());
    assert_eq!(store.count(), 0);
    assert_eq!(store.next_id(), 1);
}

#[test]
fn test_reopen_is_not_first_run() {
    let (_temp, path) = setup_temp_storage();
    {
        let (mut store, mut txn) = open(&path, 10);
        txn.close(&mut store).unwrap();
    }

    let (store, _txn) = open(&path, 10);
    assert!(!store.is_first_run());
}

// =============================================================================
// Staging Visibility Tests
// =============================================================================

#[test]
fn test_staged_put_invisible_until_commit() {
    let (_temp, path) = setup_temp_storage();
    let (mut store, mut txn) = open(&path, 10);

    let id = store.allocate_id();
    store.put(id, record("Zelda"));

    assert!(store.get(id).is_none());
    assert_eq!(store.count(), 0);
    assert!(store.iter().is_empty());

    let lsn = txn.commit(&mut store).unwrap();

    assert_eq!(lsn, Some(1));
    assert_eq!(store.get(id), Some(&record("Zelda")));
    assert_eq!(store.count(), 1);
}

#[test]
fn test_abort_discards_staged() {
    let (_temp, path) = setup_temp_storage();
    let (mut store, mut txn) = open(&path, 10);

    let id = store.allocate_id();
    store.put(id, record("Zelda"));
    txn.abort(&mut store);

    assert!(!store.has_staged());
    assert_eq!(txn.commit(&mut store).unwrap(), None);
    assert!(store.get(id).is_none());
    assert_eq!(store.next_id(), 1);
}

#[test]
fn test_delete_absent_id_is_not_found() {
    let (_temp, path) = setup_temp_storage();
    let (mut store, mut txn) = open(&path, 10);
    insert(&mut store, &mut txn, "a");

    assert!(matches!(store.delete(99), Err(CatalogError::NotFound(99))));
    assert_eq!(store.count(), 1);
}

#[test]
fn test_delete_twice_in_one_transaction() {
    let (_temp, path) = setup_temp_storage();
    let (mut store, mut txn) = open(&path, 10);
    let id = insert(&mut store, &mut txn, "a");

    store.delete(id).unwrap();
    assert!(store.delete(id).unwrap_err().is_not_found());

    txn.commit(&mut store).unwrap();
    assert!(store.get(id).is_none());
}

#[test]
fn test_multi_mutation_commit_is_one_frame() {
    let (_temp, path) = setup_temp_storage();
    let (mut store, mut txn) = open(&path, 10);

    for name in ["a", "b", "c"] {
        let id = store.allocate_id();
        store.put(id, record(name));
    }
    assert_eq!(txn.commit(&mut store).unwrap(), Some(1));
    assert_eq!(txn.current_lsn(), 2);

    let ids: Vec<u64> = store.iter().into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

// =============================================================================
// Ordering and Identifier Tests
// =============================================================================

#[test]
fn test_iteration_ascending() {
    let (_temp, path) = setup_temp_storage();
    let (mut store, mut txn) = open(&path, 10);

    store.put(30, record("c"));
    store.put(10, record("a"));
    store.put(20, record("b"));
    txn.commit(&mut store).unwrap();

    let ids: Vec<u64> = store.entries().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![10, 20, 30]);
    // Counter stays ahead of explicit ids
    assert_eq!(store.next_id(), 31);
}

#[test]
fn test_ids_never_reused_after_delete() {
    let (_temp, path) = setup_temp_storage();
    let (mut store, mut txn) = open(&path, 10);

    let a = insert(&mut store, &mut txn, "a");
    let b = insert(&mut store, &mut txn, "b");
    store.delete(b).unwrap();
    txn.commit(&mut store).unwrap();

    let c = insert(&mut store, &mut txn, "c");
    assert_eq!((a, b, c), (1, 2, 3));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_wal_replay_on_reopen() {
    let (_temp, path) = setup_temp_storage();
    {
        let (mut store, mut txn) = open(&path, 1000);
        insert(&mut store, &mut txn, "a");
        insert(&mut store, &mut txn, "b");
        store.delete(1).unwrap();
        txn.commit(&mut store).unwrap();
        assert_eq!(txn.commits_since_checkpoint(), 3);
        // Dropped without close: only the WAL holds the data
    }

    let (store, txn) = open(&path, 1000);
    assert_eq!(store.count(), 1);
    assert_eq!(store.get(2), Some(&record("b")));
    assert_eq!(store.next_id(), 3);
    // Replay was checkpointed
    assert_eq!(txn.commits_since_checkpoint(), 0);
    assert_eq!(txn.wal_len(), 0);
    assert!(store.snapshot_path().exists());
}

#[test]
fn test_checkpoint_threshold() {
    let (_temp, path) = setup_temp_storage();
    let (mut store, mut txn) = open(&path, 3);

    insert(&mut store, &mut txn, "a");
    insert(&mut store, &mut txn, "b");
    assert_eq!(txn.commits_since_checkpoint(), 2);
    assert!(txn.wal_len() > 0);

    insert(&mut store, &mut txn, "c");
    assert_eq!(txn.commits_since_checkpoint(), 0);
    assert_eq!(txn.wal_len(), 0);
    assert!(store.snapshot_path().exists());
}

#[test]
fn test_snapshot_plus_wal_reopen() {
    let (_temp, path) = setup_temp_storage();
    {
        let (mut store, mut txn) = open(&path, 2);
        insert(&mut store, &mut txn, "a");
        insert(&mut store, &mut txn, "b"); // checkpoint here
        insert(&mut store, &mut txn, "c"); // WAL only
    }

    let (store, _txn) = open(&path, 2);
    let names: Vec<String> = store.iter().into_iter().map(|(_, r)| r.name).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(store.next_id(), 4);
}

#[test]
fn test_close_checkpoints_and_empties_wal() {
    let (_temp, path) = setup_temp_storage();
    let (mut store, mut txn) = open(&path, 100);
    insert(&mut store, &mut txn, "a");

    txn.close(&mut store).unwrap();

    assert_eq!(txn.wal_len(), 0);
    assert_eq!(txn.commits_since_checkpoint(), 0);
}

#[test]
fn test_corrupt_snapshot_fails_open() {
    let (_temp, path) = setup_temp_storage();
    {
        let (mut store, mut txn) = open(&path, 100);
        insert(&mut store, &mut txn, "a");
        txn.close(&mut store).unwrap();
    }
    std::fs::write(path.join(OrderedStore::SNAPSHOT_FILENAME), b"garbage").unwrap();

    assert!(matches!(
        OrderedStore::open(&path),
        Err(CatalogError::SnapshotCorruption(_))
    ));
}
