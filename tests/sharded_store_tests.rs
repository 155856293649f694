/// Sharded store routing and result windows
use dicoterm::storage::{
    shard_dir, NoopMonitor, ShardKey, ShardMonitor, ShardProgress, ShardedStore, StoreMode,
    StoreOptions, TaxonPrefixShardKey,
};
use dicoterm::DicoError;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::Path;
use tempfile::TempDir;

const SHARDS: usize = 3;

fn options() -> StoreOptions {
    StoreOptions {
        writer_heap_bytes: 15_000_000,
        ..StoreOptions::default()
    }
}

fn write_sharded(root: &Path, entries: &[(String, String)]) {
    let mut store = ShardedStore::open(
        root,
        StoreMode::Write,
        options(),
        TaxonPrefixShardKey::new(SHARDS),
        true,
    )
    .unwrap();
    for (id, value) in entries {
        store.add(id, value).unwrap();
    }
    store.close(&NoopMonitor).unwrap();
}

fn open_reader(root: &Path) -> ShardedStore {
    ShardedStore::open(
        root,
        StoreMode::Read,
        options(),
        TaxonPrefixShardKey::new(SHARDS),
        false,
    )
    .unwrap()
}

/// `count` records for `id` plus unrelated noise in every shard
fn records(id: &str, count: usize) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = (0..count)
        .map(|i| (id.to_string(), format!("rec{}", i)))
        .collect();
    entries.push(("10090.ENSMUSP1".to_string(), "noise".to_string()));
    entries.push(("11.X".to_string(), "noise".to_string()));
    entries.push(("14.Y".to_string(), "noise".to_string()));
    entries
}

#[rstest]
#[case(4, 4)]
#[case(5, 4)]
#[case(8, 4)]
#[case(1, 10)]
#[case(20, 1)]
fn test_get_by_id_returns_every_record(#[case] count: usize, #[case] window: usize) {
    let temp = TempDir::new().unwrap();
    write_sharded(temp.path(), &records("9606.P1", count));

    let store = open_reader(temp.path());
    let terms = store.get_by_id("9606.P1", window).unwrap();

    let values: Vec<String> = terms.into_iter().map(|t| t.data_field).collect();
    let expected: Vec<String> = (0..count).map(|i| format!("rec{}", i)).collect();
    assert_eq!(values, expected);
}

#[test]
fn test_layout_and_sizes() {
    let temp = TempDir::new().unwrap();
    write_sharded(temp.path(), &records("9606.P1", 3));

    for n in 1..=SHARDS {
        assert!(shard_dir(temp.path(), n).is_dir());
    }

    let store = open_reader(temp.path());
    assert_eq!(store.shard_count(), SHARDS);
    assert_eq!(store.size().unwrap(), 6);

    let key = TaxonPrefixShardKey::new(SHARDS);
    assert_eq!(store.shard_of("9606.P1").unwrap(), key.shard_of("9606.P1").unwrap());
    assert_eq!(store.shard_of("9606.P1").unwrap(), 3);
    assert_eq!(store.size_of("9606.P1").unwrap(), 3);
    assert_eq!(store.size_of("10090.ENSMUSP1").unwrap(), 1);
    assert!(store.get_by_id("10.nothing", 10).unwrap().is_empty());
}

#[test]
fn test_invalid_keys_are_rejected() {
    let temp = TempDir::new().unwrap();
    let mut store = ShardedStore::open(
        temp.path(),
        StoreMode::Write,
        options(),
        TaxonPrefixShardKey::new(SHARDS),
        false,
    )
    .unwrap();

    assert!(matches!(store.add("AB1", "x"), Err(DicoError::InvalidShardKey(_))));
    assert!(matches!(store.add("7", "x"), Err(DicoError::InvalidShardKey(_))));
    store.close(&NoopMonitor).unwrap();

    let store = open_reader(temp.path());
    assert!(matches!(store.get_by_id("AB1", 10), Err(DicoError::InvalidShardKey(_))));
}

#[test]
fn test_missing_root_fails_in_read_mode() {
    let temp = TempDir::new().unwrap();
    let result = ShardedStore::open(
        temp.path().join("absent"),
        StoreMode::Read,
        options(),
        TaxonPrefixShardKey::new(SHARDS),
        true,
    );
    assert!(matches!(result, Err(DicoError::NotFound(_))));
}

fn open_with_shards(root: &Path, mode: StoreMode, shards: usize) -> Result<ShardedStore, DicoError> {
    ShardedStore::open(root, mode, options(), TaxonPrefixShardKey::new(shards), false)
}

#[test]
fn test_shard_count_mismatch_is_rejected() {
    let temp = TempDir::new().unwrap();
    write_sharded(temp.path(), &records("9606.P1", 2));

    for shards in [2, 5] {
        assert!(matches!(
            open_with_shards(temp.path(), StoreMode::Read, shards),
            Err(DicoError::Config(_))
        ));
    }

    std::fs::remove_dir_all(shard_dir(temp.path(), 2)).unwrap();
    assert!(matches!(
        open_with_shards(temp.path(), StoreMode::Read, SHARDS),
        Err(DicoError::Config(_))
    ));
}

#[test]
fn test_rewrite_with_fewer_shards_drops_stale_ones() {
    let temp = TempDir::new().unwrap();
    write_sharded(temp.path(), &records("9606.P1", 2));

    let mut store = open_with_shards(temp.path(), StoreMode::Write, 2).unwrap();
    store.add("9606.P1", "rewritten").unwrap();
    store.close(&NoopMonitor).unwrap();
    assert!(!shard_dir(temp.path(), 3).exists());

    let store = open_with_shards(temp.path(), StoreMode::Read, 2).unwrap();
    let values: Vec<String> = store
        .get_by_id("9606.P1", 10)
        .unwrap()
        .into_iter()
        .map(|t| t.data_field)
        .collect();
    assert_eq!(values, vec!["rewritten".to_string()]);
}

#[derive(Default)]
struct RecordingMonitor {
    seen: Mutex<Vec<ShardProgress>>,
}

impl ShardMonitor for RecordingMonitor {
    fn shard_done(&self, progress: ShardProgress) {
        self.seen.lock().push(progress);
    }
}

struct AbortingMonitor;

impl ShardMonitor for AbortingMonitor {
    fn should_abort(&self) -> bool {
        true
    }
}

#[test]
fn test_monitor_sees_every_shard() {
    let temp = TempDir::new().unwrap();
    let monitor = RecordingMonitor::default();
    let mut store = ShardedStore::open_with_monitor(
        temp.path(),
        StoreMode::Write,
        options(),
        TaxonPrefixShardKey::new(SHARDS),
        true,
        &monitor,
    )
    .unwrap();
    store.add("9606.P1", "x").unwrap();

    let closing = RecordingMonitor::default();
    store.close(&closing).unwrap();

    for seen in [monitor.seen.lock(), closing.seen.lock()] {
        let mut shards: Vec<usize> = seen.iter().map(|p| p.shard).collect();
        shards.sort();
        assert_eq!(shards, vec![1, 2, 3]);
        assert!(seen.iter().all(|p| p.total == SHARDS));
        assert_eq!(seen.iter().map(|p| p.completed).max(), Some(SHARDS));
    }
}

#[test]
fn test_abort_stops_opening() {
    let temp = TempDir::new().unwrap();
    let result = ShardedStore::open_with_monitor(
        temp.path(),
        StoreMode::Write,
        options(),
        TaxonPrefixShardKey::new(SHARDS),
        false,
        &AbortingMonitor,
    );
    assert!(matches!(result, Err(DicoError::Aborted)));
}
