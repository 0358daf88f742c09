use ahash::AHashMap;

use crate::error::{Result, StorageError};
use crate::provider::{apply_put_range, validate_key, StorageProvider};

/// An in-memory [`StorageProvider`]. `flush` is a no-op: there is no slower layer underneath it.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    map: AHashMap<String, Vec<u8>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageProvider for MemoryProvider {
    fn get(&mut self, key: &str) -> Result<Vec<u8>> {
        self.map.get(key).cloned().ok_or_else(|| StorageError::NotFound {
            key: key.to_owned(),
        })
    }

    fn get_range(&mut self, key: &str, offset: usize, length: usize) -> Result<Vec<u8>> {
        let value = self.get(key)?;
        let end = (offset + length).min(value.len());
        let start = offset.min(value.len());
        Ok(value[start..end].to_vec())
    }

    fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<()> {
        validate_key(key)?;
        self.map.insert(key.to_owned(), bytes);
        Ok(())
    }

    fn put_range(&mut self, key: &str, bytes: &[u8], offset: usize, overwrite: bool) -> Result<()> {
        validate_key(key)?;
        let existing = self.map.remove(key);
        let updated = apply_put_range(existing, bytes, offset, overwrite);
        self.map.insert(key.to_owned(), updated);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.map
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound { key: key.to_owned() })
    }

    fn iterate(&self) -> Vec<String> {
        self.map.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// S5 from the storage-provider scenario suite.
    #[test]
    fn s5_provider_round_trip() {
        let mut p = MemoryProvider::new();
        p.put("a", b"hello world".to_vec()).unwrap();
        assert_eq!(p.get_range("a", 2, 3).unwrap(), b"llo");

        p.put_range("a", b"abcde", 6, false).unwrap();
        assert_eq!(p.get("a").unwrap(), b"hello abcde");

        p.put_range("a", b"new_text", 0, true).unwrap();
        assert_eq!(p.get("a").unwrap(), b"new_text");

        p.put_range("b", b"hello world", 3, false).unwrap();
        assert_eq!(p.get("b").unwrap(), b"\x00\x00\x00hello world");
    }

    #[test]
    fn get_missing_key_fails() {
        let mut p = MemoryProvider::new();
        assert!(matches!(p.get("missing"), Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn delete_missing_key_fails() {
        let mut p = MemoryProvider::new();
        assert!(matches!(p.delete("missing"), Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn short_read_past_end_of_value() {
        let mut p = MemoryProvider::new();
        p.put("a", b"hi".to_vec()).unwrap();
        assert_eq!(p.get_range("a", 0, 100).unwrap(), b"hi");
    }

    #[test]
    fn iterate_and_len() {
        let mut p = MemoryProvider::new();
        p.put("a", b"1".to_vec()).unwrap();
        p.put("b", b"2".to_vec()).unwrap();
        assert_eq!(p.len(), 2);
        let mut keys = p.iterate();
        keys.sort();
        assert_eq!(keys, vec!["a".to_owned(), "b".to_owned()]);
    }
}
