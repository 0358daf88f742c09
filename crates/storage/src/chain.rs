use crate::error::{Result, StorageError};
use crate::lru::LruProvider;
use crate::provider::StorageProvider;

/// Per-layer budgets for [`build_cache_chain`], grouped for ergonomic reuse across call sites
/// that need to rebuild the same chain shape against different backing providers.
#[derive(Debug, Clone, Default)]
pub struct CacheChainConfig {
    pub layer_budgets: Vec<u64>,
}

impl CacheChainConfig {
    pub fn new(layer_budgets: Vec<u64>) -> Self {
        Self { layer_budgets }
    }

    /// See [`build_cache_chain`].
    pub fn build(&self, providers: Vec<Box<dyn StorageProvider>>) -> Result<Box<dyn StorageProvider>> {
        build_cache_chain(providers, &self.layer_budgets)
    }
}

/// Composes a list of providers `[P0, P1, ..., Pk]` into a single tiered cache chain.
///
/// `Pk` (the last provider) is the slowest, largest terminal layer and is used unchanged. Each
/// preceding provider `Pi` becomes the backing store of an LRU layer of `budgets[i]` bytes, which
/// wraps the chain built from `P(i+1)..Pk`. The caller only ever interacts with the outermost
/// layer -- `P0`'s wrapper -- and every operation cascades down through the nested wrappers to
/// the terminal provider as needed.
///
/// `budgets` must have exactly `providers.len() - 1` entries, one per non-terminal layer.
pub fn build_cache_chain(mut providers: Vec<Box<dyn StorageProvider>>, budgets: &[u64]) -> Result<Box<dyn StorageProvider>> {
    let Some(terminal) = providers.pop() else {
        return Err(StorageError::InvalidArgument {
            reason: "cache chain requires at least one provider".to_owned(),
        });
    };
    if providers.len() != budgets.len() {
        return Err(StorageError::InvalidArgument {
            reason: format!(
                "expected {} budgets for {} non-terminal layers, got {}",
                providers.len(),
                providers.len(),
                budgets.len()
            ),
        });
    }

    let mut chain: Box<dyn StorageProvider> = terminal;
    for (cache_store, &budget) in providers.into_iter().rev().zip(budgets.iter().rev()) {
        chain = Box::new(LruProvider::new(cache_store, chain, budget));
    }
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileProvider, MemoryProvider};

    #[test]
    fn single_provider_chain_is_passthrough() {
        let chain = build_cache_chain(vec![Box::new(MemoryProvider::new())], &[]).unwrap();
        let mut chain = chain;
        chain.put("a", b"1".to_vec()).unwrap();
        assert_eq!(chain.get("a").unwrap(), b"1");
    }

    #[test]
    fn mismatched_budget_count_is_rejected() {
        let providers: Vec<Box<dyn StorageProvider>> = vec![Box::new(MemoryProvider::new()), Box::new(MemoryProvider::new())];
        assert!(matches!(build_cache_chain(providers, &[]), Err(StorageError::InvalidArgument { .. })));
    }

    /// Mirrors the tiered-cache scenario (S6): twenty 16 MiB entries through a
    /// `memory(32 MiB) -> local` chain should only keep `floor(32MiB / 16MiB) == 2` entries
    /// resident in the memory tier, and every entry must survive a flush across fresh provider
    /// instances over the same local directory.
    ///
    /// Built directly as an `LruProvider` (rather than through `build_cache_chain`'s `Box<dyn
    /// StorageProvider>`) so the test can inspect `used_bytes()` -- exercising the same
    /// single-layer composition `build_cache_chain` would produce for this shape.
    #[test]
    fn s6_tiered_cache_through_local_disk() {
        const MB: u64 = 1024 * 1024;
        const ENTRY_SIZE: u64 = 16 * MB;
        let dir = tempfile::tempdir().unwrap();

        let mut chain = LruProvider::new(Box::new(MemoryProvider::new()), Box::new(FileProvider::new(dir.path()).unwrap()), 32 * MB);

        for i in 0..20 {
            let key = format!("chunk-{i}");
            chain.put(&key, vec![i as u8; ENTRY_SIZE as usize]).unwrap();
        }
        assert_eq!(chain.used_bytes(), 2 * ENTRY_SIZE);
        assert!(chain.used_bytes() <= chain.budget());

        chain.flush().unwrap();
        drop(chain);

        let mut chain = LruProvider::new(Box::new(MemoryProvider::new()), Box::new(FileProvider::new(dir.path()).unwrap()), 32 * MB);
        for i in 0..20 {
            let key = format!("chunk-{i}");
            let value = chain.get(&key).unwrap();
            assert_eq!(value, vec![i as u8; ENTRY_SIZE as usize]);
        }
    }

    #[test]
    fn three_tier_chain_composes() {
        let providers: Vec<Box<dyn StorageProvider>> = vec![Box::new(MemoryProvider::new()), Box::new(MemoryProvider::new()), Box::new(MemoryProvider::new())];
        let mut chain = build_cache_chain(providers, &[1024, 4096]).unwrap();
        chain.put("a", b"hello".to_vec()).unwrap();
        assert_eq!(chain.get("a").unwrap(), b"hello");
        chain.flush().unwrap();
    }
}
