use std::{collections::BTreeMap, path::PathBuf, sync::Mutex};

use {anyhow::Result, tracing::warn};

use crate::RecordStore;

/// File-based record storage: a single JSON object at `<data_dir>/records.json`.
///
/// Reads that fail (missing file, malformed JSON) degrade to an empty record
/// set with a warning; a corrupt file must never fail the caller.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            path: data_dir.join("records.json"),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store backed by a specific file (useful for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    fn read_map(&self) -> BTreeMap<String, String> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "record file read failed");
                return BTreeMap::new();
            },
        };
        match serde_json::from_str(&data) {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "record file parse failed");
                BTreeMap::new()
            },
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, &data)?;

        // Session material is sensitive; keep the file private on unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}

impl RecordStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_map();
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (FileStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        (store, dir)
    }

    #[test]
    fn set_and_get() {
        let (store, _dir) = temp_store();
        store.set("authToken", "tok-123").unwrap();
        assert_eq!(store.get("authToken").unwrap().as_deref(), Some("tok-123"));
    }

    #[test]
    fn get_missing_key() {
        let (store, _dir) = temp_store();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn remove_key() {
        let (store, _dir) = temp_store();
        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
        // Removing again is a no-op.
        store.remove("k").unwrap();
    }

    #[test]
    fn overwrite_preserves_other_keys() {
        let (store, _dir) = temp_store();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.set("a", "3").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("3"));
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, "not json {").unwrap();

        let store = FileStore::with_path(path);
        assert!(store.get("authToken").unwrap().is_none());
        // A write after corruption starts a fresh record set.
        store.set("authToken", "tok").unwrap();
        assert_eq!(store.get("authToken").unwrap().as_deref(), Some("tok"));
    }
}
