//! End-to-end skip/run/record scenarios against a real SQLite store.

use std::sync::Arc;

use hashmake::{CancelFlag, FileSetRule, HashStore, Outcome, SkipEngine, SqliteStore};
use tempfile::TempDir;

fn strs(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

fn open_store(dir: &TempDir) -> Arc<dyn HashStore> {
    Arc::new(SqliteStore::open(&dir.path().join("hashes.db")).unwrap())
}

/// Source a.txt containing "x", target b.txt absent, command cp.
/// First invocation: miss, run, record. Second: hit, no run. After
/// editing the source: miss again.
#[test]
fn copy_scenario_miss_hit_miss() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("a.txt");
    let tgt = dir.path().join("b.txt");
    std::fs::write(&src, "x").unwrap();

    // Hashed paths resolve from the process cwd, so declare them
    // absolute; the command itself runs inside dir.
    let rule = FileSetRule::new(
        vec![src.to_str().unwrap().to_string()],
        vec![tgt.to_str().unwrap().to_string()],
        strs(&["cp", "a.txt", "b.txt"]),
    )
    .with_dir(dir.path());

    let store = open_store(&dir);
    let engine = SkipEngine::new(rule, store);
    let cancel = CancelFlag::new();

    assert_eq!(engine.invoke(&cancel).unwrap(), Outcome::Rebuilt);
    assert_eq!(std::fs::read_to_string(&tgt).unwrap(), "x");

    // No changes: cache hit, and the target is left alone.
    let mtime_before = std::fs::metadata(&tgt).unwrap().modified().unwrap();
    assert_eq!(engine.invoke(&cancel).unwrap(), Outcome::Satisfied);
    assert_eq!(
        std::fs::metadata(&tgt).unwrap().modified().unwrap(),
        mtime_before
    );

    // Source changed: miss, rebuild propagates the new content.
    std::fs::write(&src, "y").unwrap();
    assert_eq!(engine.invoke(&cancel).unwrap(), Outcome::Rebuilt);
    assert_eq!(std::fs::read_to_string(&tgt).unwrap(), "y");
}

/// A target deleted out-of-band makes the content hash differ from the
/// recorded one, so the engine rebuilds.
#[test]
fn deleted_target_forces_rebuild() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("a.txt");
    let tgt = dir.path().join("b.txt");
    std::fs::write(&src, "payload").unwrap();

    let rule = FileSetRule::new(
        vec![src.to_str().unwrap().to_string()],
        vec![tgt.to_str().unwrap().to_string()],
        strs(&["cp", src.to_str().unwrap(), tgt.to_str().unwrap()]),
    );
    let store = open_store(&dir);
    let engine = SkipEngine::new(rule, store);
    let cancel = CancelFlag::new();

    assert_eq!(engine.invoke(&cancel).unwrap(), Outcome::Rebuilt);
    assert_eq!(engine.invoke(&cancel).unwrap(), Outcome::Satisfied);

    std::fs::remove_file(&tgt).unwrap();
    assert_eq!(engine.invoke(&cancel).unwrap(), Outcome::Rebuilt);
    assert!(tgt.exists());
}

/// Touching the source without changing its bytes must not trigger a
/// rebuild; only content matters.
#[test]
fn identical_bytes_still_hit_after_rewrite() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("a.txt");
    let tgt = dir.path().join("b.txt");
    std::fs::write(&src, "same").unwrap();

    let rule = FileSetRule::new(
        vec![src.to_str().unwrap().to_string()],
        vec![tgt.to_str().unwrap().to_string()],
        strs(&["cp", src.to_str().unwrap(), tgt.to_str().unwrap()]),
    );
    let store = open_store(&dir);
    let engine = SkipEngine::new(rule, store);
    let cancel = CancelFlag::new();

    assert_eq!(engine.invoke(&cancel).unwrap(), Outcome::Rebuilt);

    // Rewrite identical bytes; mtime changes, content does not.
    std::fs::write(&src, "same").unwrap();
    assert_eq!(engine.invoke(&cancel).unwrap(), Outcome::Satisfied);
}

/// A failing command surfaces its error and leaves the store untouched:
/// the very next invocation still tries to rebuild.
#[test]
fn failed_build_is_not_cached() {
    let dir = TempDir::new().unwrap();
    let rule = FileSetRule::new(vec![], vec![], strs(&["false"]));
    let store = open_store(&dir);
    let engine = SkipEngine::new(rule, store);
    let cancel = CancelFlag::new();

    assert!(engine.invoke(&cancel).is_err());
    assert!(engine.invoke(&cancel).is_err());
}

/// Two engines over structurally identical rules share cache state
/// through the store.
#[test]
fn identical_rules_share_cache() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("a.txt");
    let tgt = dir.path().join("b.txt");
    std::fs::write(&src, "shared").unwrap();

    let make_rule = || {
        FileSetRule::new(
            vec![src.to_str().unwrap().to_string()],
            vec![tgt.to_str().unwrap().to_string()],
            strs(&["cp", src.to_str().unwrap(), tgt.to_str().unwrap()]),
        )
    };
    let store = open_store(&dir);
    let first = SkipEngine::new(make_rule(), store.clone());
    let second = SkipEngine::new(make_rule(), store);
    let cancel = CancelFlag::new();

    assert_eq!(first.invoke(&cancel).unwrap(), Outcome::Rebuilt);
    assert_eq!(second.invoke(&cancel).unwrap(), Outcome::Satisfied);
    assert_eq!(first.task_id("gen"), second.task_id("gen"));
}

/// Recorded state survives reopening the same store file, as a host
/// tool would across process restarts.
#[test]
fn cache_hit_survives_store_reopen() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("hashes.db");
    let src = dir.path().join("a.txt");
    let tgt = dir.path().join("b.txt");
    std::fs::write(&src, "persistent").unwrap();

    let make_rule = || {
        FileSetRule::new(
            vec![src.to_str().unwrap().to_string()],
            vec![tgt.to_str().unwrap().to_string()],
            strs(&["cp", src.to_str().unwrap(), tgt.to_str().unwrap()]),
        )
    };
    let cancel = CancelFlag::new();

    {
        let store: Arc<dyn HashStore> = Arc::new(SqliteStore::open(&db).unwrap());
        let engine = SkipEngine::new(make_rule(), store);
        assert_eq!(engine.invoke(&cancel).unwrap(), Outcome::Rebuilt);
    }

    let store: Arc<dyn HashStore> = Arc::new(SqliteStore::open(&db).unwrap());
    let engine = SkipEngine::new(make_rule(), store);
    assert_eq!(engine.invoke(&cancel).unwrap(), Outcome::Satisfied);
}
