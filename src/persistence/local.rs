//! # Local Filesystem Store
//!
//! One file per key, `{root}/{key}.json`. Writes go to a temporary file
//! first and are renamed into place, so a crash mid-write leaves the
//! previous value intact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::backend::{validate_key, KeyValueStore};
use super::errors::{PersistenceError, PersistenceResult};

const EXTENSION: &str = "json";

/// Filesystem-backed key-value store
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> PersistenceResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| PersistenceError::Io(root.display().to_string(), e.to_string()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, key: &str) -> PersistenceResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.{}", key, EXTENSION)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        let path = self.full_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::Io(key.to_string(), e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> PersistenceResult<()> {
        let path = self.full_path(key)?;
        let tmp = path.with_extension(format!("{}.tmp", EXTENSION));

        fs::write(&tmp, value).map_err(|e| PersistenceError::Io(key.to_string(), e.to_string()))?;
        fs::rename(&tmp, &path).map_err(|e| PersistenceError::Io(key.to_string(), e.to_string()))
    }

    fn remove(&self, key: &str) -> PersistenceResult<()> {
        let path = self.full_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::Io(key.to_string(), e.to_string())),
        }
    }

    fn keys(&self) -> PersistenceResult<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| PersistenceError::Io(self.root.display().to_string(), e.to_string()))?;

        let mut keys: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension()? != EXTENSION {
                    return None;
                }
                path.file_stem()?.to_str().map(str::to_string)
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        store.set("configs", "[]").unwrap();
        assert_eq!(store.get("configs").unwrap(), Some("[]".to_string()));
        assert!(temp.path().join("configs.json").exists());
    }

    #[test]
    fn test_missing_key_is_none() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        assert_eq!(store.get("nothing").unwrap(), None);
    }

    #[test]
    fn test_overwrite_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        store.set("user_notes", "{}").unwrap();
        store.set("user_notes", r#"{"row-1":[]}"#).unwrap();

        assert_eq!(store.get("user_notes").unwrap().unwrap(), r#"{"row-1":[]}"#);
        assert_eq!(store.keys().unwrap(), vec!["user_notes".to_string()]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        store.set("cookieConsent", "{}").unwrap();
        store.remove("cookieConsent").unwrap();
        store.remove("cookieConsent").unwrap();
        assert_eq!(store.get("cookieConsent").unwrap(), None);
    }

    #[test]
    fn test_path_like_key_rejected() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(PersistenceError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_open_creates_nested_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("a").join("b");
        let store = FileStore::open(&root).unwrap();
        store.set("k", "1").unwrap();
        assert!(root.join("k.json").exists());
    }
}
