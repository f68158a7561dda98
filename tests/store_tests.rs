//! Persistence and concurrency behavior of the SQLite hash store.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hashmake::{CancelFlag, Hash256, HashStore, SqliteStore};
use tempfile::TempDir;

#[test]
fn membership_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("hashes.db");
    let cancel = CancelFlag::new();
    let h = Hash256::digest(b"persists");

    {
        let store = SqliteStore::open(&db).unwrap();
        store.add(&cancel, &h).unwrap();
        assert!(store.has(&cancel, &h).unwrap());
    }

    let store = SqliteStore::open(&db).unwrap();
    assert!(store.has(&cancel, &h).unwrap());
    assert!(!store.has(&cancel, &Hash256::digest(b"never added")).unwrap());
}

#[test]
fn open_creates_schema_in_fresh_file() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("nested").join("hashes.db");
    std::fs::create_dir_all(db.parent().unwrap()).unwrap();

    let store = SqliteStore::open(&db).unwrap();
    let cancel = CancelFlag::new();
    assert!(!store.has(&cancel, &Hash256::digest(b"anything")).unwrap());
    assert!(db.exists());
}

#[test]
fn entries_within_retention_window_survive() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(&dir.path().join("hashes.db"))
        .unwrap()
        .with_retention(Duration::from_secs(3600));
    let cancel = CancelFlag::new();

    let h = Hash256::digest(b"young");
    store.add(&cancel, &h).unwrap();
    // A later add sweeps stale entries; this one is well inside the window.
    store.add(&cancel, &Hash256::digest(b"other")).unwrap();
    assert!(store.has(&cancel, &h).unwrap());
}

#[test]
fn concurrent_adds_and_lookups_stay_consistent() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("hashes.db")).unwrap());

    let mut handles = Vec::new();
    for t in 0..8u8 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            let cancel = CancelFlag::new();
            for i in 0..50u32 {
                // Half the hashes are shared across threads, half unique.
                let key = if i % 2 == 0 {
                    format!("shared-{i}")
                } else {
                    format!("thread-{t}-{i}")
                };
                let h = Hash256::digest(key.as_bytes());
                store.add(&cancel, &h).unwrap();
                assert!(store.has(&cancel, &h).unwrap());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Every key written by any thread is present afterwards.
    let cancel = CancelFlag::new();
    for i in (0..50u32).step_by(2) {
        let h = Hash256::digest(format!("shared-{i}").as_bytes());
        assert!(store.has(&cancel, &h).unwrap());
    }
}

#[test]
fn two_connections_to_the_same_file_interoperate() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("hashes.db");
    let a = SqliteStore::open(&db).unwrap();
    let b = SqliteStore::open(&db).unwrap();
    let cancel = CancelFlag::new();

    let h = Hash256::digest(b"cross-connection");
    a.add(&cancel, &h).unwrap();
    assert!(b.has(&cancel, &h).unwrap());
}
