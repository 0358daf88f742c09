use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::provider::StorageProvider;

/// A coarse-locked, thread-safe handle to a [`StorageProvider`].
///
/// Every provider in this crate is single-threaded; `Shared` is the seam where a caller who needs
/// to hand the same cache chain to multiple worker threads gets one, without every implementation
/// having to carry its own locking. One `parking_lot::Mutex` guards the whole provider, so calls
/// serialize rather than interleave -- fine for the coarse, infrequent-contention access pattern
/// this crate targets.
pub struct Shared<P: ?Sized> {
    inner: Arc<Mutex<Box<P>>>,
}

// Manual impl: `Arc::clone` only bumps a refcount and never needs `P: Clone`, but a derived
// `Clone` would add that bound anyway -- which `dyn StorageProvider` can never satisfy.
impl<P: ?Sized> Clone for Shared<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: StorageProvider + ?Sized> Shared<P> {
    pub fn new(provider: Box<P>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(provider)),
        }
    }
}

impl<P: StorageProvider + ?Sized> StorageProvider for Shared<P> {
    fn get(&mut self, key: &str) -> Result<Vec<u8>> {
        self.inner.lock().get(key)
    }

    fn get_range(&mut self, key: &str, offset: usize, length: usize) -> Result<Vec<u8>> {
        self.inner.lock().get_range(key, offset, length)
    }

    fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.inner.lock().put(key, bytes)
    }

    fn put_range(&mut self, key: &str, bytes: &[u8], offset: usize, overwrite: bool) -> Result<()> {
        self.inner.lock().put_range(key, bytes, offset, overwrite)
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.inner.lock().delete(key)
    }

    fn iterate(&self) -> Vec<String> {
        self.inner.lock().iterate()
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.lock().flush()
    }
}
