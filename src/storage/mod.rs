//! Local cache for the workflow snapshot.
//!
//! The snapshot is stored as three independently keyed JSON strings in a
//! [`KeyValueStore`]. Writes overwrite whole values (last write wins) and reads
//! never fail: anything absent or unparseable falls back to its empty default.

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::models::WorkflowSnapshot;

pub const NODES_KEY: &str = "workflowNodes";
pub const EDGES_KEY: &str = "workflowEdges";
pub const SELECTED_KEY: &str = "selectedFeatureIds";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A string-to-string store, the shape of a browser's local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Saves and restores [`WorkflowSnapshot`]s through a [`KeyValueStore`].
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn save(&self, snapshot: &WorkflowSnapshot) -> Result<(), StorageError> {
        self.store.set(NODES_KEY, &serde_json::to_string(&snapshot.nodes)?)?;
        self.store.set(EDGES_KEY, &serde_json::to_string(&snapshot.edges)?)?;
        self.store.set(
            SELECTED_KEY,
            &serde_json::to_string(&snapshot.selected_feature_ids)?,
        )?;
        Ok(())
    }

    /// Load the saved snapshot. Each entry falls back to empty on its own.
    pub fn load(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            nodes: self.load_entry(NODES_KEY),
            edges: self.load_entry(EDGES_KEY),
            selected_feature_ids: self.load_entry(SELECTED_KEY),
        }
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        for key in [NODES_KEY, EDGES_KEY, SELECTED_KEY] {
            self.store.remove(key)?;
        }
        Ok(())
    }

    fn load_entry<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!("Failed to read {} from cache, using default: {}", key, e);
                return T::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Discarding unparseable {} entry: {}", key, e);
            T::default()
        })
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence").finish_non_exhaustive()
    }
}
