//! Defines the custom error type for the `cascade-seal` crate.

use crate::cascade::Layer;
use crate::storage::StoreError;
use crate::symmetric::errors::BlockCipherError;
use thiserror::Error;

/// The main error type for the `cascade-seal` crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("input cannot be empty")]
    EmptyInput,

    #[error("invalid {layer} key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        layer: Layer,
        expected: usize,
        actual: usize,
    },

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("decryption failed with all {attempts} available key combinations")]
    AllCandidatesExhausted { attempts: usize },

    #[error("key store access denied: {0}")]
    AccessDenied(String),

    #[error("key store unavailable: {0}")]
    KeyStoreUnavailable(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("decrypted data is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("{layer} encryption failed: {source}")]
    Encryption {
        layer: Layer,
        #[source]
        source: BlockCipherError,
    },

    #[error("key generation failed: {0}")]
    KeyGeneration(#[from] rand_core::OsError),

    #[error("async task failed: {0}")]
    AsyncTask(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blocking call from inside a current-thread async runtime; use the async form")]
    BlockingInAsyncContext,
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccessDenied(msg) => Error::AccessDenied(msg),
            other => Error::KeyStoreUnavailable(other.to_string()),
        }
    }
}
