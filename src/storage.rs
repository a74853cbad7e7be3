//! Persistent key-value stores for default overrides.
//!
//! Values are whole strings replaced atomically per key; nothing here ever
//! merges partial updates. Read failures are logged and reported as missing.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::ParamsError;

/// String key-value store addressed by one key per blueprint set.
pub trait ParamStore {
    /// Stored value, or `None` when absent or unreadable.
    fn get(&self, key: &str) -> Option<String>;

    /// Replace the value under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), ParamsError>;

    /// Delete the value under `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), ParamsError>;
}

/// Process-local store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ParamStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ParamsError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ParamsError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file (`{"key": "value", ...}`).
///
/// Every write rewrites the whole file through a temporary file in the same
/// directory that is then renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> BTreeMap<String, String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read parameter store");
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "parameter store is not valid JSON; ignoring");
            BTreeMap::new()
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), ParamsError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| ParamsError::Storage(e.to_string()))?;
        let io_err = |source: std::io::Error| ParamsError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.as_file().sync_all().map_err(io_err)?;
        file.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

impl ParamStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ParamsError> {
        let mut entries = self.load();
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), ParamsError> {
        let mut entries = self.load();
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k"), None);
        store.set("k", "rows=50").unwrap();
        store.set("k", "rows=75").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("rows=75"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.json");

        let mut store = JsonFileStore::new(&path);
        assert_eq!(store.get("alerts"), None);

        store.set("alerts", "query=evil").unwrap();
        store.set("submit", "rows=10").unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("alerts").as_deref(), Some("query=evil"));
        assert_eq!(reopened.get("submit").as_deref(), Some("rows=10"));

        store.remove("alerts").unwrap();
        assert_eq!(reopened.get("alerts"), None);
    }

    #[test]
    fn test_json_file_store_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.json");
        std::fs::write(&path, "{\"stale\": \"x\", \"padding\": \"yyyyyyyyyyyyyyyyyyyy\"}").unwrap();

        let mut store = JsonFileStore::new(&path);
        store.remove("padding").unwrap();
        store.set("alerts", "q=1").unwrap();

        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(on_disk.get("alerts").map(String::as_str), Some("q=1"));
        assert_eq!(on_disk.get("stale").map(String::as_str), Some("x"));

        // No temporary files are left next to the store.
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_json_file_store_missing_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("missing/defaults.json"));
        let err = store.set("alerts", "q=1").unwrap_err();
        assert_eq!(err.code(), "IO");
    }

    #[test]
    fn test_json_file_store_corrupt_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.json");
        std::fs::write(&path, "not json").unwrap();

        let mut store = JsonFileStore::new(&path);
        assert_eq!(store.get("alerts"), None);

        store.set("alerts", "q=1").unwrap();
        assert_eq!(store.get("alerts").as_deref(), Some("q=1"));
    }
}
