//! Byte-addressable key/value storage providers and a tiered, write-back LRU cache chain.
//!
//! [`StorageProvider`] is the shared abstraction; [`MemoryProvider`] and [`FileProvider`] are the
//! two concrete backends this crate ships, [`LruProvider`] is the cache layer that wraps one
//! provider around another, and [`build_cache_chain`] composes a whole tiered chain from a list of
//! providers and per-layer budgets.

mod chain;
mod error;
mod file;
mod lru;
mod memory;
mod provider;
mod shared;

pub use chain::{build_cache_chain, CacheChainConfig};
pub use error::{Result, StorageError};
pub use file::FileProvider;
pub use lru::LruProvider;
pub use memory::MemoryProvider;
pub use provider::{StorageProvider, MAX_KEY_LEN};
pub use shared::Shared;
