/// Errors raised by [`crate::StorageProvider`] implementations and the layers that wrap them.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("key not found: {key}")]
    NotFound { key: String },

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("backend failure on key {key:?}: {source}")]
    BackendFailure {
        key: Option<String>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StorageError {
    pub fn backend(key: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::BackendFailure {
            key: Some(key.into()),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
