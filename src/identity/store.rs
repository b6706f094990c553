use anyhow::{anyhow, Context, Result};
use log::warn;
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Durable string key-value storage, the shape of a host's preferences API.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Persist pending writes. Values set before a successful flush survive a restart.
    fn flush(&self) -> Result<()>;
}

type Entries = BTreeMap<String, String>;

fn read_entries(data: &RwLock<Entries>) -> Result<RwLockReadGuard<'_, Entries>> {
    data.read().map_err(|_| anyhow!("store lock poisoned"))
}

fn write_entries(data: &RwLock<Entries>) -> Result<RwLockWriteGuard<'_, Entries>> {
    data.write().map_err(|_| anyhow!("store lock poisoned"))
}

/// Key-value store backed by a single pretty-printed JSON object on disk.
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<Entries>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read store from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unparsable store {}: {err}", path.display());
                Entries::default()
            })
        } else {
            Entries::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(read_entries(&self.data)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        write_entries(&self.data)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let guard = read_entries(&self.data)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create store directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(&*guard)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write store to {}", self.path.display()))
    }
}

/// Process-local store. Nothing survives the process; useful for embedding hosts
/// that manage persistence themselves and for tests.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Entries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every key, as if the host wiped its preferences.
    pub fn clear(&self) -> Result<()> {
        write_entries(&self.data)?.clear();
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(read_entries(&self.data)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        write_entries(&self.data)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
