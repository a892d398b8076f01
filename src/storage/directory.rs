//! Directory-backed intermediate store
//!
//! Layout: `<root>/<run id>/<key>.json`. Lets each stage run in its own
//! process, as long as every process points at the same root.

use super::IntermediateStore;
use crate::config::RunId;
use eyre::{Context, Result, eyre};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Store entries as JSON files under a root directory
pub struct DirectoryStore {
    path: PathBuf,
}

impl DirectoryStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create store directory: {}", path.display()))?;
        Ok(Self { path })
    }

    /// Directory holding one run's entries
    pub fn run_dir(&self, run: &RunId) -> PathBuf {
        self.path.join(run.as_str())
    }

    fn entry_path(&self, run: &RunId, key: &str) -> Result<PathBuf> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(eyre!("Invalid store key: {:?}", key));
        }
        Ok(self.run_dir(run).join(format!("{}.json", key)))
    }

    /// Keys currently stored for a run
    pub fn keys(&self, run: &RunId) -> Result<Vec<String>> {
        let dir = self.run_dir(run);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl IntermediateStore for DirectoryStore {
    fn put(&self, run: &RunId, key: &str, value: Value) -> Result<()> {
        let path = self.entry_path(run, key)?;
        let dir = self.run_dir(run);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create run directory: {}", dir.display()))?;

        // Write then rename so a reader never sees a half-written entry
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec(&value)?;
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write store entry: {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to commit store entry: {}", path.display()))?;

        log::debug!("Stored {} for run {}", key, run);
        Ok(())
    }

    fn get(&self, run: &RunId, key: &str) -> Result<Value> {
        let path = self.entry_path(run, key)?;
        if !path.exists() {
            return Err(eyre!("No value stored under key '{}' for run {}", key, run));
        }

        let content = std::fs::read(&path)
            .with_context(|| format!("Failed to read store entry: {}", path.display()))?;
        serde_json::from_slice(&content)
            .with_context(|| format!("Failed to parse store entry: {}", path.display()))
    }

    fn discard(&self, run: &RunId) -> Result<()> {
        let dir = self.run_dir(run);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to remove run directory: {}", dir.display()))?;
            log::debug!("Discarded intermediate state for run {}", run);
        }
        Ok(())
    }
}
