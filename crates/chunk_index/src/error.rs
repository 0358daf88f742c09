/// Errors raised by [`crate::ChunkNameEncoder`] and the persisted index format.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum EncoderError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("sample index {index} out of range: num_samples is {num_samples}")]
    OutOfRange { index: i64, num_samples: u64 },

    #[error("malformed persisted index: {reason}")]
    Malformed { reason: String },
}

pub type Result<T> = std::result::Result<T, EncoderError>;
