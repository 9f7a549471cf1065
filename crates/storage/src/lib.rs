use celes_types::BlockNum;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub mod retention;

pub use retention::{prune_snapshots, PruneReport, RetentionPolicy};

/// Storage errors
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(u64),
    #[error("Corrupt snapshot key: {0}")]
    CorruptKey(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Descriptor of one stored snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Monotonic snapshot number, assigned by the store
    pub sequence: u64,
    /// Chain head the state was taken at
    pub head_block: BlockNum,
    /// Payload size in bytes
    pub size: u64,
}

/// A snapshot with its serialized state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSnapshot {
    pub meta: SnapshotMeta,
    pub payload: Vec<u8>,
}

impl StoredSnapshot {
    /// Deserialize the payload into the state type it was saved from.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}

/// Abstract snapshot store
pub trait StateStore: Send + Sync {
    /// Append a snapshot and return its sequence number.
    fn put_snapshot(&self, head_block: BlockNum, payload: Vec<u8>) -> Result<u64>;
    fn get_snapshot(&self, sequence: u64) -> Result<Option<StoredSnapshot>>;
    fn latest_snapshot(&self) -> Result<Option<StoredSnapshot>>;
    /// Snapshot descriptors, oldest first.
    fn list_snapshots(&self) -> Result<Vec<SnapshotMeta>>;
    /// Remove a snapshot; returns false if it did not exist.
    fn delete_snapshot(&self, sequence: u64) -> Result<bool>;
    fn flush(&self) -> Result<()>;
}

/// Serialize `state` and append it as a new snapshot.
pub fn save_state<S, T>(store: &S, head_block: BlockNum, state: &T) -> Result<u64>
where
    S: StateStore + ?Sized,
    T: Serialize,
{
    let payload = serde_json::to_vec(state)?;
    let sequence = store.put_snapshot(head_block, payload)?;
    debug!(target: "storage", "saved snapshot {} at block {}", sequence, head_block);
    Ok(sequence)
}

/// Load the most recent snapshot, if any.
pub fn load_latest<S, T>(store: &S) -> Result<Option<(SnapshotMeta, T)>>
where
    S: StateStore + ?Sized,
    T: DeserializeOwned,
{
    store
        .latest_snapshot()?
        .map(|snapshot| Ok((snapshot.meta.clone(), snapshot.decode()?)))
        .transpose()
}

/// Sled-backed implementation
pub struct SledStateStore {
    db: Db,
    snapshots: Tree,
    meta: Tree,
}

impl SledStateStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        let snapshots = db.open_tree("snapshots")?;
        let meta = db.open_tree("snapshot_meta")?;
        info!(target: "storage", "opened state store with {} snapshots", meta.len());
        Ok(Self { db, snapshots, meta })
    }

    fn decode_key(key: &[u8]) -> Result<u64> {
        let bytes: [u8; 8] = key
            .try_into()
            .map_err(|_| StorageError::CorruptKey(format!("{:?}", key)))?;
        Ok(u64::from_be_bytes(bytes))
    }

    fn next_sequence(&self) -> Result<u64> {
        match self.meta.last()? {
            Some((key, _)) => Ok(Self::decode_key(&key)? + 1),
            None => Ok(1),
        }
    }

    fn load(&self, sequence: u64) -> Result<Option<StoredSnapshot>> {
        let key = sequence.to_be_bytes();
        let Some(meta) = self.meta.get(key)? else {
            return Ok(None);
        };
        let payload = self
            .snapshots
            .get(key)?
            .ok_or(StorageError::SnapshotNotFound(sequence))?;
        Ok(Some(StoredSnapshot {
            meta: serde_json::from_slice(&meta)?,
            payload: payload.to_vec(),
        }))
    }
}

impl StateStore for SledStateStore {
    fn put_snapshot(&self, head_block: BlockNum, payload: Vec<u8>) -> Result<u64> {
        let sequence = self.next_sequence()?;
        let key = sequence.to_be_bytes();
        let meta = SnapshotMeta {
            sequence,
            head_block,
            size: payload.len() as u64,
        };
        self.snapshots.insert(key, payload)?;
        self.meta.insert(key, serde_json::to_vec(&meta)?)?;
        Ok(sequence)
    }

    fn get_snapshot(&self, sequence: u64) -> Result<Option<StoredSnapshot>> {
        self.load(sequence)
    }

    fn latest_snapshot(&self) -> Result<Option<StoredSnapshot>> {
        match self.meta.last()? {
            Some((key, _)) => self.load(Self::decode_key(&key)?),
            None => Ok(None),
        }
    }

    fn list_snapshots(&self) -> Result<Vec<SnapshotMeta>> {
        self.meta
            .iter()
            .map(|entry| {
                let (_, value) = entry?;
                Ok(serde_json::from_slice::<SnapshotMeta>(&value)?)
            })
            .collect()
    }

    fn delete_snapshot(&self, sequence: u64) -> Result<bool> {
        let key = sequence.to_be_bytes();
        let existed = self.meta.remove(key)?.is_some();
        self.snapshots.remove(key)?;
        Ok(existed)
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

/// In-memory implementation (for tests and ephemeral runs)
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    snapshots: Arc<RwLock<BTreeMap<u64, StoredSnapshot>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn put_snapshot(&self, head_block: BlockNum, payload: Vec<u8>) -> Result<u64> {
        let mut snapshots = self.snapshots.write();
        let sequence = snapshots.keys().next_back().map_or(1, |last| last + 1);
        let meta = SnapshotMeta {
            sequence,
            head_block,
            size: payload.len() as u64,
        };
        snapshots.insert(sequence, StoredSnapshot { meta, payload });
        Ok(sequence)
    }

    fn get_snapshot(&self, sequence: u64) -> Result<Option<StoredSnapshot>> {
        Ok(self.snapshots.read().get(&sequence).cloned())
    }

    fn latest_snapshot(&self) -> Result<Option<StoredSnapshot>> {
        Ok(self.snapshots.read().values().next_back().cloned())
    }

    fn list_snapshots(&self) -> Result<Vec<SnapshotMeta>> {
        Ok(self
            .snapshots
            .read()
            .values()
            .map(|snapshot| snapshot.meta.clone())
            .collect())
    }

    fn delete_snapshot(&self, sequence: u64) -> Result<bool> {
        Ok(self.snapshots.write().remove(&sequence).is_some())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        value: u32,
    }

    #[test]
    fn test_memory_store_sequences() {
        let store = MemoryStateStore::new();
        assert!(store.latest_snapshot().unwrap().is_none());
        assert_eq!(save_state(&store, 10, &Counter { value: 1 }).unwrap(), 1);
        assert_eq!(save_state(&store, 20, &Counter { value: 2 }).unwrap(), 2);

        let (meta, latest): (SnapshotMeta, Counter) = load_latest(&store).unwrap().unwrap();
        assert_eq!(meta.sequence, 2);
        assert_eq!(meta.head_block, 20);
        assert_eq!(latest, Counter { value: 2 });

        assert!(store.delete_snapshot(1).unwrap());
        assert!(!store.delete_snapshot(1).unwrap());
        assert_eq!(store.list_snapshots().unwrap().len(), 1);
    }

    #[test]
    fn test_decode_wrong_type_fails() {
        let store = MemoryStateStore::new();
        store.put_snapshot(1, b"not json".to_vec()).unwrap();
        let result: Result<Option<(SnapshotMeta, Counter)>> = load_latest(&store);
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }
}
