//! Integration tests for the snapshot stores (sled and in-memory).

use celes_storage::{
    load_latest, prune_snapshots, save_state, MemoryStateStore, RetentionPolicy, SledStateStore, SnapshotMeta,
    StateStore,
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct State {
    head: u32,
    producers: Vec<String>,
}

fn state(head: u32) -> State {
    State {
        head,
        producers: vec!["alice".into(), "bob".into()],
    }
}

fn exercise_store<S: StateStore>(store: &S) {
    for head in [10, 20, 30, 40, 50] {
        save_state(store, head, &state(head)).unwrap();
    }
    let (meta, latest): (SnapshotMeta, State) = load_latest(store).unwrap().unwrap();
    assert_eq!(meta.sequence, 5);
    assert_eq!(latest, state(50));

    let report = prune_snapshots(store, &RetentionPolicy::keep_latest(2)).unwrap();
    assert_eq!(report.pruned_entries, 3);
    assert_eq!(report.retained_entries, 2);

    let heads: Vec<u32> = store
        .list_snapshots()
        .unwrap()
        .iter()
        .map(|m| m.head_block)
        .collect();
    assert_eq!(heads, vec![40, 50]);

    // sequences keep growing after pruning
    assert_eq!(save_state(store, 60, &state(60)).unwrap(), 6);
    let old = store.get_snapshot(4).unwrap().unwrap();
    assert_eq!(old.decode::<State>().unwrap(), state(40));
    assert!(store.get_snapshot(1).unwrap().is_none());
}

#[test]
fn memory_store_round_trip() {
    exercise_store(&MemoryStateStore::new());
}

#[test]
fn sled_store_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = SledStateStore::new(dir.path()).unwrap();
    exercise_store(&store);
    store.flush().unwrap();
}

#[test]
fn sled_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = SledStateStore::new(dir.path()).unwrap();
        save_state(&store, 7, &state(7)).unwrap();
        store.flush().unwrap();
    }
    let store = SledStateStore::new(dir.path()).unwrap();
    let (meta, restored): (SnapshotMeta, State) = load_latest(&store).unwrap().unwrap();
    assert_eq!(meta.head_block, 7);
    assert_eq!(restored, state(7));
    assert_eq!(save_state(&store, 8, &state(8)).unwrap(), 2);
}
