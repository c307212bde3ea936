//! Hierarchical configuration store
//!
//! Values live in a single JSON tree addressed by path segments
//! (`["frontend", "plugin", "core.pydio", "APPLICATION_TITLE"]`). Readers take an
//! immutable [`ConfigSnapshot`] per request; writers go through the store's write
//! lock and are committed with [`ConfigStore::save`], which bumps the version.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Store shared between the server state, the context builder and migrations
pub type SharedStore = Arc<dyn ConfigStore>;

/// Scoped key/value access with versioned persistence
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Immutable view of the whole tree at the current version
    async fn snapshot(&self) -> StoreResult<ConfigSnapshot>;

    async fn get(&self, path: &[&str]) -> StoreResult<Option<Value>>;

    /// Set a value, creating intermediate nodes as needed
    async fn set(&self, value: Value, path: &[&str]) -> StoreResult<()>;

    /// Remove a key. Removing a key that does not exist succeeds.
    async fn delete(&self, path: &[&str]) -> StoreResult<()>;

    /// Commit pending changes and return the new version
    async fn save(&self, actor: &str, description: &str) -> StoreResult<u64>;
}

/// One committed change set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRevision {
    pub version: u64,
    pub actor: String,
    pub description: String,
    pub saved_at: DateTime<Utc>,
}

/// Read-only view of the configuration tree
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    tree: Arc<Value>,
    version: u64,
}

impl ConfigSnapshot {
    pub fn new(tree: Value, version: u64) -> Self {
        Self {
            tree: Arc::new(tree),
            version,
        }
    }

    pub fn empty() -> Self {
        Self::new(Value::Object(Map::new()), 0)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Look up a value; JSON `null` counts as absent
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        lookup(&self.tree, path).filter(|value| !value.is_null())
    }

    pub fn get_str(&self, path: &[&str]) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_i64(&self, path: &[&str]) -> Option<i64> {
        self.get(path).and_then(Value::as_i64)
    }

    /// Entries of the object at `path`, in key order
    pub fn children(&self, path: &[&str]) -> impl Iterator<Item = (&str, &Value)> {
        self.get(path)
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|map| map.iter().map(|(key, value)| (key.as_str(), value)))
    }

    /// String items of the array at `path`; non-string items are skipped
    pub fn string_list(&self, path: &[&str]) -> Vec<String> {
        self.get(path)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn lookup<'a>(tree: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(tree, |node, segment| node.as_object()?.get(*segment))
}

fn validate_path(path: &[&str]) -> StoreResult<()> {
    if path.is_empty() {
        return Err(StoreError::invalid_path(path, "path is empty"));
    }
    if path.iter().any(|segment| segment.is_empty()) {
        return Err(StoreError::invalid_path(path, "empty segment"));
    }
    Ok(())
}

fn insert(tree: &mut Value, path: &[&str], value: Value) {
    let (last, parents) = match path.split_last() {
        Some(split) => split,
        None => return,
    };

    let mut node = tree;
    for segment in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => unreachable!("node was just made an object"),
        };
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        map.insert(last.to_string(), value);
    }
}

fn remove(tree: &mut Value, path: &[&str]) -> bool {
    let (last, parents) = match path.split_last() {
        Some(split) => split,
        None => return false,
    };

    let mut node = tree;
    for segment in parents {
        node = match node.as_object_mut().and_then(|map| map.get_mut(*segment)) {
            Some(child) => child,
            None => return false,
        };
    }

    node.as_object_mut()
        .map(|map| map.remove(*last).is_some())
        .unwrap_or(false)
}

/// On-disk layout of a persisted store
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStore {
    version: u64,
    tree: Value,
    #[serde(default)]
    history: Vec<ConfigRevision>,
}

#[derive(Debug)]
struct StoreState {
    tree: Arc<Value>,
    version: u64,
    history: Vec<ConfigRevision>,
}

/// In-process store, optionally persisted to a JSON file on save
#[derive(Debug)]
pub struct MemoryConfigStore {
    state: RwLock<StoreState>,
    persist_to: Option<PathBuf>,
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with an existing tree at version 0
    pub fn from_value(tree: Value) -> Self {
        Self {
            state: RwLock::new(StoreState {
                tree: Arc::new(tree),
                version: 0,
                history: Vec::new(),
            }),
            persist_to: None,
        }
    }

    /// Open a file-backed store; a missing file starts an empty store
    pub async fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let persisted: PersistedStore = serde_json::from_slice(&bytes)?;
                info!(
                    path = %path.display(),
                    version = persisted.version,
                    "Loaded configuration store"
                );
                StoreState {
                    tree: Arc::new(persisted.tree),
                    version: persisted.version,
                    history: persisted.history,
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Starting empty configuration store");
                StoreState {
                    tree: Arc::new(Value::Object(Map::new())),
                    version: 0,
                    history: Vec::new(),
                }
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        Ok(Self {
            state: RwLock::new(state),
            persist_to: Some(path),
        })
    }

    /// Committed revisions, oldest first
    pub async fn history(&self) -> Vec<ConfigRevision> {
        self.state.read().await.history.clone()
    }

    async fn persist(&self, state: &StoreState) -> StoreResult<()> {
        let Some(path) = &self.persist_to else {
            return Ok(());
        };

        let persisted = PersistedStore {
            version: state.version,
            tree: state.tree.as_ref().clone(),
            history: state.history.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&persisted)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!(path = %path.display(), version = state.version, "Persisted configuration store");
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn snapshot(&self) -> StoreResult<ConfigSnapshot> {
        let state = self.state.read().await;
        Ok(ConfigSnapshot {
            tree: Arc::clone(&state.tree),
            version: state.version,
        })
    }

    async fn get(&self, path: &[&str]) -> StoreResult<Option<Value>> {
        validate_path(path)?;
        let state = self.state.read().await;
        Ok(lookup(&state.tree, path)
            .filter(|value| !value.is_null())
            .cloned())
    }

    async fn set(&self, value: Value, path: &[&str]) -> StoreResult<()> {
        validate_path(path)?;
        let mut state = self.state.write().await;
        insert(Arc::make_mut(&mut state.tree), path, value);
        Ok(())
    }

    async fn delete(&self, path: &[&str]) -> StoreResult<()> {
        validate_path(path)?;
        let mut state = self.state.write().await;
        if lookup(&state.tree, path).is_some() {
            remove(Arc::make_mut(&mut state.tree), path);
        }
        Ok(())
    }

    async fn save(&self, actor: &str, description: &str) -> StoreResult<u64> {
        let mut state = self.state.write().await;

        // committed only once it is on disk
        let mut candidate = StoreState {
            tree: Arc::clone(&state.tree),
            version: state.version + 1,
            history: state.history.clone(),
        };
        candidate.history.push(ConfigRevision {
            version: candidate.version,
            actor: actor.to_string(),
            description: description.to_string(),
            saved_at: Utc::now(),
        });
        self.persist(&candidate).await?;
        *state = candidate;

        info!(version = state.version, actor, description, "Saved configuration");
        Ok(state.version)
    }
}
