//! A compact, queryable index mapping a global, monotonically increasing sample index to the set
//! of storage chunks that physically hold that sample.
//!
//! The index is append-only: samples are attached to a newly opened chunk or to the
//! currently-last chunk, and a sample may be split across any number of chunks by chaining
//! zero-sample "continuation" attachments. See [`ChunkNameEncoder`] for the full state machine.

mod encoder;
mod error;
mod format;

pub use encoder::ChunkNameEncoder;
pub use error::{EncoderError, Result};
pub use format::{decode, encode};
