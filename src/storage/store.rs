//! Run-scoped key/value handoff between stages

use crate::config::RunId;
use crate::dataset::Dataset;
use eyre::{Context, Result, eyre};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Key of the dataset written by the extract stage
pub const RAW_DATA_KEY: &str = "raw_data";
/// Key of the target table name written by the extract stage
pub const TABLE_KEY: &str = "table";
/// Key of the normalized dataset written by the transform stage
pub const CLEAN_DATA_KEY: &str = "clean_data";

/// Intermediate store contract
///
/// Entries are addressed by `(run id, key)`. A missing key on [`get`] is an
/// error, never a default. The pipeline assumes at most one writer per
/// `(run id, key)` and takes no locks of its own; concurrent runs are
/// separated only by their run id.
///
/// [`get`]: IntermediateStore::get
pub trait IntermediateStore: Send + Sync {
    /// Store a value, replacing any previous value for the same key
    fn put(&self, run: &RunId, key: &str, value: Value) -> Result<()>;

    /// Fetch a value
    ///
    /// # Errors
    /// Returns an error if the key was never written for this run or the
    /// backend cannot be read.
    fn get(&self, run: &RunId, key: &str) -> Result<Value>;

    /// Drop everything stored for a run
    fn discard(&self, run: &RunId) -> Result<()>;
}

/// Typed helpers over the JSON values held by a store
pub trait IntermediateStoreExt: IntermediateStore {
    fn put_dataset(&self, run: &RunId, key: &str, dataset: &Dataset) -> Result<()> {
        let value = serde_json::to_value(dataset)
            .with_context(|| format!("Failed to serialize dataset for key '{}'", key))?;
        self.put(run, key, value)
    }

    fn get_dataset(&self, run: &RunId, key: &str) -> Result<Dataset> {
        let value = self.get(run, key)?;
        serde_json::from_value(value)
            .with_context(|| format!("Failed to deserialize dataset under key '{}'", key))
    }

    fn put_text(&self, run: &RunId, key: &str, text: &str) -> Result<()> {
        self.put(run, key, Value::String(text.to_string()))
    }

    fn get_text(&self, run: &RunId, key: &str) -> Result<String> {
        match self.get(run, key)? {
            Value::String(s) => Ok(s),
            other => Err(eyre!("Expected a string under key '{}', found {}", key, other)),
        }
    }
}

impl<S: IntermediateStore + ?Sized> IntermediateStoreExt for S {}

/// In-process store, for runs whose stages share one process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<(RunId, String), Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held for a run
    pub fn count(&self, run: &RunId) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.keys().filter(|(r, _)| r == run).count())
            .unwrap_or(0)
    }
}

impl IntermediateStore for MemoryStore {
    fn put(&self, run: &RunId, key: &str, value: Value) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| eyre!("Memory store lock poisoned"))?;
        entries.insert((run.clone(), key.to_string()), value);
        Ok(())
    }

    fn get(&self, run: &RunId, key: &str) -> Result<Value> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| eyre!("Memory store lock poisoned"))?;
        entries
            .get(&(run.clone(), key.to_string()))
            .cloned()
            .ok_or_else(|| eyre!("No value stored under key '{}' for run {}", key, run))
    }

    fn discard(&self, run: &RunId) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| eyre!("Memory store lock poisoned"))?;
        entries.retain(|(r, _), _| r != run);
        Ok(())
    }
}
