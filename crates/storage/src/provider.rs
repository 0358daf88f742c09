use crate::error::{Result, StorageError};

/// Maximum length, in bytes, of a provider key (see the external-interfaces key-space contract).
pub const MAX_KEY_LEN: usize = 1024;

/// Validates a key against the provider key-space contract: UTF-8 (guaranteed by `&str`), no
/// embedded NUL, length at most [`MAX_KEY_LEN`].
pub fn validate_key(key: &str) -> Result<()> {
    if key.len() > MAX_KEY_LEN {
        return Err(StorageError::InvalidArgument {
            reason: format!("key length {} exceeds the {MAX_KEY_LEN}-byte limit", key.len()),
        });
    }
    if key.contains('\0') {
        return Err(StorageError::InvalidArgument {
            reason: "key contains an embedded NUL byte".to_owned(),
        });
    }
    Ok(())
}

/// A byte-addressable key/value store with range reads, ranged writes, delete, iteration, and an
/// explicit durability barrier.
///
/// Implementations are single-threaded cooperative: no internal locking is required, and every
/// method call is expected to run to completion without suspending. Callers who need to share a
/// provider across threads can wrap it in [`crate::Shared`].
pub trait StorageProvider {
    /// Reads the entire value stored at `key`. Fails with [`StorageError::NotFound`] if absent.
    fn get(&mut self, key: &str) -> Result<Vec<u8>>;

    /// Reads `length` bytes starting at `offset`. A short read (fewer bytes than `length`) is
    /// only permitted when it runs past the end of the stored value.
    fn get_range(&mut self, key: &str, offset: usize, length: usize) -> Result<Vec<u8>>;

    /// Replaces the entire value stored at `key`.
    fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// Writes `bytes` at `offset` within the value at `key`.
    ///
    /// If the key does not exist, a new value of length `offset + bytes.len()` is created,
    /// zero-filled in `[0, offset)`. If `overwrite` is true, the value is replaced by exactly
    /// `bytes` (the offset is otherwise ignored).
    fn put_range(&mut self, key: &str, bytes: &[u8], offset: usize, overwrite: bool) -> Result<()>;

    /// Removes `key`. Fails with [`StorageError::NotFound`] if absent.
    fn delete(&mut self, key: &str) -> Result<()>;

    /// Returns every key currently stored, in unspecified order. Snapshot-consistent: concurrent
    /// mutation during iteration need not be observed.
    fn iterate(&self) -> Vec<String>;

    /// Number of distinct keys currently stored.
    fn len(&self) -> usize;

    /// Returns whether the provider currently holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Best-effort durability barrier: propagates buffered writes so that a fresh provider over
    /// the same backing store observes them.
    fn flush(&mut self) -> Result<()>;
}

/// Applies the read-modify-write semantics of [`StorageProvider::put_range`] to an in-memory
/// buffer, creating it (zero-filled up to `offset`) if it doesn't exist yet.
///
/// Shared by [`crate::MemoryProvider`], [`crate::FileProvider`], and the LRU layer's
/// read-modify-write path so the three don't each reimplement the byte-patching rules.
pub(crate) fn apply_put_range(
    existing: Option<Vec<u8>>,
    bytes: &[u8],
    offset: usize,
    overwrite: bool,
) -> Vec<u8> {
    if overwrite {
        return bytes.to_vec();
    }

    let mut buf = existing.unwrap_or_default();
    let end = offset + bytes.len();
    if buf.len() < end {
        buf.resize(end, 0);
    }
    buf[offset..end].copy_from_slice(bytes);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_range_extends_and_zero_fills() {
        let out = apply_put_range(None, b"hello world", 3, false);
        assert_eq!(out, b"\x00\x00\x00hello world");
    }

    #[test]
    fn put_range_preserves_untouched_bytes() {
        let out = apply_put_range(Some(b"hello world".to_vec()), b"abcde", 6, false);
        assert_eq!(out, b"hello abcde");
    }

    #[test]
    fn put_range_overwrite_replaces_whole_value() {
        let out = apply_put_range(Some(b"hello world".to_vec()), b"new_text", 0, true);
        assert_eq!(out, b"new_text");
    }

    #[test]
    fn rejects_embedded_nul() {
        assert!(validate_key("a\0b").is_err());
    }

    #[test]
    fn rejects_overlong_key() {
        let key = "a".repeat(MAX_KEY_LEN + 1);
        assert!(validate_key(&key).is_err());
    }
}
