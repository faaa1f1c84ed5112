use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

/// Persisted ledger state. Carries the session metadata and balance only;
/// private key material is never written to durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub address: String,
    pub created_at: u64,
    pub expires_at: u64,
    pub balance: u64,
    pub is_active: bool,
}

/// Durable storage for the ledger snapshot under one fixed key.
///
/// The session context writes on every mutating operation and reads once at
/// construction. Implementations are not required to coordinate across
/// processes; two hosts sharing one store can race (accepted limitation).
pub trait SnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>>;
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
    fn remove(&self) -> Result<()>;
}

/// In-memory store for tests and ephemeral hosts. Holds the serialized JSON
/// form, mirroring a string key-value store like browser local storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        match slot.as_deref() {
            Some(json) => Ok(Some(
                serde_json::from_str(json).context("failed to decode snapshot")?,
            )),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot).context("failed to encode snapshot")?;
        *self
            .slot
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))? = Some(json);
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        *self
            .slot
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))? = None;
        Ok(())
    }
}

/// JSON file store, the native analog of the browser's local storage slot.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&json)
            .with_context(|| format!("failed to decode {}", self.path.display()))?;
        debug!(event = "snapshot_loaded", path = %self.path.display(), "Loaded snapshot");
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot).context("failed to encode snapshot")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        debug!(event = "snapshot_saved", path = %self.path.display(), "Saved snapshot");
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot {
            address: "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin".to_string(),
            created_at: 1_000,
            expires_at: 7_201_000,
            balance: 98,
            is_active: true,
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().expect("load").is_none());
        store.save(&snapshot()).expect("save");
        assert_eq!(store.load().expect("load"), Some(snapshot()));
        store.remove().expect("remove");
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("goodshits.json"));
        assert!(store.load().expect("load").is_none());
        store.save(&snapshot()).expect("save");
        assert_eq!(store.load().expect("load"), Some(snapshot()));
        store.remove().expect("remove");
        assert!(store.load().expect("load").is_none());
        // Removing twice is fine
        store.remove().expect("remove");
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = serde_json::to_string(&snapshot()).expect("encode");
        assert!(json.contains("\"createdAt\":1000"));
        assert!(json.contains("\"isActive\":true"));
        assert!(!json.contains("key"));
    }
}
