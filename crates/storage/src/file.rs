use std::path::{Path, PathBuf};

use crate::error::{Result, StorageError};
use crate::provider::{apply_put_range, validate_key, StorageProvider};

/// A local-disk [`StorageProvider`]: one file per key, rooted under a directory.
///
/// This is the "local-disk layer" the tiered cache chain composes against when no remote
/// object-store backend is wired in -- the spec treats such backends as out-of-scope external
/// collaborators (see the crate's top-level purpose note), so this is the slowest terminal layer
/// this codebase ships on its own.
#[derive(Debug)]
pub struct FileProvider {
    root: PathBuf,
}

impl FileProvider {
    /// Opens (creating if necessary) a file-backed provider rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|err| StorageError::backend("<root>", err))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn read(&self, key: &str) -> Result<Vec<u8>> {
        std::fs::read(self.path_for(key)).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound { key: key.to_owned() }
            } else {
                StorageError::backend(key, err)
            }
        })
    }
}

impl StorageProvider for FileProvider {
    fn get(&mut self, key: &str) -> Result<Vec<u8>> {
        self.read(key)
    }

    fn get_range(&mut self, key: &str, offset: usize, length: usize) -> Result<Vec<u8>> {
        let value = self.read(key)?;
        let start = offset.min(value.len());
        let end = (offset + length).min(value.len());
        Ok(value[start..end].to_vec())
    }

    fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<()> {
        validate_key(key)?;
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| StorageError::backend(key, err))?;
        }
        std::fs::write(&path, bytes).map_err(|err| StorageError::backend(key, err))
    }

    fn put_range(&mut self, key: &str, bytes: &[u8], offset: usize, overwrite: bool) -> Result<()> {
        validate_key(key)?;
        let existing = match self.read(key) {
            Ok(bytes) => Some(bytes),
            Err(StorageError::NotFound { .. }) => None,
            Err(err) => return Err(err),
        };
        let updated = apply_put_range(existing, bytes, offset, overwrite);
        self.put(key, updated)
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        std::fs::remove_file(self.path_for(key)).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound { key: key.to_owned() }
            } else {
                StorageError::backend(key, err)
            }
        })
    }

    fn iterate(&self) -> Vec<String> {
        walkdir::WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| key_for(&self.root, entry.path()))
            .collect()
    }

    fn len(&self) -> usize {
        self.iterate().len()
    }

    fn flush(&mut self) -> Result<()> {
        // Every write above goes through `std::fs::write`, which is already durable once it
        // returns on most platforms we target; there is no further buffering to flush here.
        Ok(())
    }
}

fn key_for(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .and_then(|relative| relative.to_str())
        .map(|s| s.replace(std::path::MAIN_SEPARATOR, "/"))
}
