use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

const MAX_KEY_LEN: usize = 64;

/// Key/value slot storage for save blobs. Mirrors the browser's local storage:
/// one string per key, missing keys read as `None`.
pub trait SaveStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<bool, StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Checks a slot key before it is used as a file name.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let invalid = |reason| StoreError::InvalidKey {
        key: key.to_string(),
        reason,
    };
    if key.is_empty() {
        return Err(invalid("key is empty"));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(invalid("key is longer than 64 bytes"));
    }
    if key.starts_with('.') {
        return Err(invalid("key cannot start with a dot"));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(invalid("only ASCII letters, digits, '_', '-' and '.' are allowed"));
    }
    Ok(())
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    slots: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        Ok(self.slots.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.slots.keys().cloned().collect())
    }
}

/// Stores each slot as `<root>/<key>.json`. The directory is created on the
/// first write.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn slot_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl SaveStorage for DirectoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::io(path, err)),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.slot_path(key)?;
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(|err| StoreError::io(&self.root, err))?;
        }
        log::debug!("writing save slot {key} to {}", path.display());
        fs::write(&path, value).map_err(|err| StoreError::io(path, err))
    }

    fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::io(path, err)),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(&self.root, err)),
        };
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io(&self.root, err))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if validate_key(stem).is_ok() {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn key_validation_blocks_path_tricks() {
        assert!(validate_key("cyberquest_save").is_ok());
        assert!(validate_key("slot-2.backup").is_ok());
        for bad in ["", "../escape", "a/b", ".hidden", "with space"] {
            assert!(
                matches!(validate_key(bad), Err(StoreError::InvalidKey { .. })),
                "{bad:?} should be rejected"
            );
        }
        assert!(validate_key(&"x".repeat(65)).is_err());
    }

    #[test]
    fn memory_storage_behaves_like_local_storage() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.read("cyberquest_save").expect("read"), None);
        storage.write("cyberquest_save", "{}").expect("write");
        assert_eq!(
            storage.read("cyberquest_save").expect("read").as_deref(),
            Some("{}")
        );
        assert_eq!(storage.keys().expect("keys"), vec!["cyberquest_save"]);
        assert!(storage.remove("cyberquest_save").expect("remove"));
        assert!(!storage.remove("cyberquest_save").expect("remove again"));
    }

    #[test]
    fn directory_storage_creates_root_and_lists_slots() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("saves");
        let mut storage = DirectoryStorage::new(&root);

        assert_eq!(storage.keys().expect("keys before write"), Vec::<String>::new());
        assert_eq!(storage.read("cyberquest_save").expect("read missing"), None);

        storage.write("cyberquest_save", "{\"day\":1}").expect("write");
        storage.write("alt", "{}").expect("write alt");
        fs::write(root.join("notes.txt"), "ignored").expect("write stray file");

        assert!(root.join("cyberquest_save.json").is_file());
        assert_eq!(storage.keys().expect("keys"), vec!["alt", "cyberquest_save"]);
        assert_eq!(
            storage.read("cyberquest_save").expect("read").as_deref(),
            Some("{\"day\":1}")
        );
        assert!(storage.remove("alt").expect("remove"));
        assert!(storage.write("../x", "{}").is_err());
    }
}
