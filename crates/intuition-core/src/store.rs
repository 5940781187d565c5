//! Persistence of per-node static data.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::error::StoreError;
use crate::state::StaticData;

/// Loads and saves the static data of trigger nodes, keyed by node name.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Static data for `node`; empty when nothing was saved yet.
    async fn load(&self, node: &str) -> Result<StaticData, StoreError>;

    /// Replace the static data for `node`.
    async fn save(&self, node: &str, data: &StaticData) -> Result<(), StoreError>;

    /// Forget `node`. Returns whether anything was stored.
    async fn reset(&self, node: &str) -> Result<bool, StoreError>;

    /// Names of nodes with stored data, sorted.
    async fn nodes(&self) -> Result<Vec<String>, StoreError>;
}

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for std::sync::Arc<T> {
    async fn load(&self, node: &str) -> Result<StaticData, StoreError> {
        (**self).load(node).await
    }

    async fn save(&self, node: &str, data: &StaticData) -> Result<(), StoreError> {
        (**self).save(node, data).await
    }

    async fn reset(&self, node: &str) -> Result<bool, StoreError> {
        (**self).reset(node).await
    }

    async fn nodes(&self) -> Result<Vec<String>, StoreError> {
        (**self).nodes().await
    }
}

/// Process-local store. State is lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    nodes: Mutex<HashMap<String, StaticData>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StaticData>>, StoreError> {
        self.nodes
            .lock()
            .map_err(|_| StoreError::backend("memory store lock poisoned"))
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, node: &str) -> Result<StaticData, StoreError> {
        Ok(self.lock()?.get(node).cloned().unwrap_or_default())
    }

    async fn save(&self, node: &str, data: &StaticData) -> Result<(), StoreError> {
        self.lock()?.insert(node.to_string(), data.clone());
        Ok(())
    }

    async fn reset(&self, node: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.remove(node).is_some())
    }

    async fn nodes(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.lock()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

type NodeMap = BTreeMap<String, StaticData>;

/// All nodes in a single JSON document on disk.
///
/// Writes go to a sibling temporary file that then replaces the
/// document, so a crash mid-write leaves the previous one intact.
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<NodeMap, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(NodeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(NodeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, nodes: &NodeMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let json = serde_json::to_string_pretty(nodes)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), nodes = nodes.len(), "State file written");
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self, node: &str) -> Result<StaticData, StoreError> {
        Ok(self.read_all().await?.remove(node).unwrap_or_default())
    }

    async fn save(&self, node: &str, data: &StaticData) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut nodes = self.read_all().await?;
        nodes.insert(node.to_string(), data.clone());
        self.write_all(&nodes).await
    }

    async fn reset(&self, node: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut nodes = self.read_all().await?;
        if nodes.remove(node).is_none() {
            return Ok(false);
        }
        self.write_all(&nodes).await?;
        Ok(true)
    }

    async fn nodes(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read_all().await?.into_keys().collect())
    }
}
