//! 128-bit chunk identifiers, and conversion to/from their printable hex form.

use std::fmt;

/// Errors that can occur when parsing a chunk name back into a [`ChunkId`].
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ChunkIdError {
    #[error("chunk name has wrong length: expected {expected} hex digits, got {got}")]
    WrongLength { expected: usize, got: usize },

    #[error("chunk name contains non-hex-digit characters: {name:?}")]
    NotHex { name: String },
}

pub type Result<T> = std::result::Result<T, ChunkIdError>;

/// Number of hex digits in a printable chunk name (128 bits / 4 bits per digit).
const NAME_LEN: usize = 32;

/// A 128-bit globally unique identifier for a chunk.
///
/// Collisions within a single dataset are considered impossible in practice: with a uniformly
/// random 128-bit value, a dataset would need to generate on the order of 10^18 chunks before
/// the birthday bound becomes a real concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkId(u128);

impl ChunkId {
    /// Wraps a raw 128-bit value as a [`ChunkId`].
    #[inline]
    pub fn from_u128(value: u128) -> Self {
        Self(value)
    }

    /// Returns the raw 128-bit value.
    #[inline]
    pub fn as_u128(self) -> u128 {
        self.0
    }

    /// Generates a new chunk id from a uniformly random, OS-seeded source.
    ///
    /// This is not cryptographically hardened on purpose -- uniqueness, not unpredictability,
    /// is the property we need.
    pub fn generate() -> Self {
        Self(rand::random())
    }

    /// Formats this id as its canonical lowercase hex chunk name.
    pub fn name(self) -> String {
        format!("{:032x}", self.0)
    }

    /// Parses a chunk name produced by [`Self::name`] back into a [`ChunkId`].
    pub fn from_name(name: &str) -> Result<Self> {
        if name.len() != NAME_LEN {
            return Err(ChunkIdError::WrongLength {
                expected: NAME_LEN,
                got: name.len(),
            });
        }
        u128::from_str_radix(name, 16)
            .map(Self)
            .map_err(|_| ChunkIdError::NotHex {
                name: name.to_owned(),
            })
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Generates a new, globally-unique chunk id.
pub fn generate_chunk_id() -> ChunkId {
    ChunkId::generate()
}

/// Renders a chunk id as its canonical lowercase hex name.
pub fn name_from_id(id: ChunkId) -> String {
    id.name()
}

/// Parses a chunk name back into a [`ChunkId`].
pub fn id_from_name(name: &str) -> Result<ChunkId> {
    ChunkId::from_name(name)
}
