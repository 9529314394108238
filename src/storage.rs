//! Key version storage: the store contract, versioned naming and backends.

pub mod file_storage;
pub mod memory;
pub mod traits;

pub use file_storage::FileKeyStore;
pub use memory::InMemoryKeyStore;
pub use traits::KeyVersionStore;

use crate::common::config::ProviderConfig;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Separator between the logical name and the version number in a storage id.
pub const VERSION_SEPARATOR: &str = "--v";

/// Errors reported by a [`KeyVersionStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("secret already exists: {0}")]
    AlreadyExists(String),

    #[error("secret payload is malformed: {0}")]
    MalformedPayload(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => StoreError::AccessDenied(err.to_string()),
            _ => StoreError::Io(err),
        }
    }
}

/// A parsed storage id of the form `"{logical_name}--v{version}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionedName {
    pub logical_name: String,
    pub version: u32,
}

impl VersionedName {
    pub fn new(logical_name: impl Into<String>, version: u32) -> Self {
        Self {
            logical_name: logical_name.into(),
            version,
        }
    }

    /// Parses a storage id. The version must be a positive decimal integer
    /// without leading zeros.
    pub fn parse(storage_id: &str) -> Option<Self> {
        let (logical_name, digits) = storage_id.rsplit_once(VERSION_SEPARATOR)?;
        if logical_name.is_empty()
            || digits.is_empty()
            || digits.starts_with('0')
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let version = digits.parse::<u32>().ok()?;
        Some(Self::new(logical_name, version))
    }

    /// Parses `storage_id` and keeps it only if it belongs to `logical_name`.
    pub fn parse_for(storage_id: &str, logical_name: &str) -> Option<Self> {
        Self::parse(storage_id).filter(|parsed| parsed.logical_name == logical_name)
    }

    pub fn storage_id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for VersionedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.logical_name, VERSION_SEPARATOR, self.version)
    }
}

/// One listed version of a logical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVersion {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub storage_id: String,
}

impl StoredVersion {
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.created_at)
    }
}

/// Encodes a raw key as the string value stored at rest.
pub fn encode_payload(secret: &[u8]) -> String {
    BASE64.encode(secret)
}

/// Decodes a stored string value back into raw key bytes.
pub fn decode_payload(storage_id: &str, value: &str) -> Result<Vec<u8>, StoreError> {
    BASE64
        .decode(value.trim())
        .map_err(|e| StoreError::MalformedPayload(format!("{storage_id}: {e}")))
}

/// Builds the configured backend. Called once at construction time.
pub fn build_store(provider: &ProviderConfig) -> Result<Arc<dyn KeyVersionStore>, StoreError> {
    let store: Arc<dyn KeyVersionStore> = match provider {
        ProviderConfig::Memory => Arc::new(InMemoryKeyStore::new()),
        ProviderConfig::File { directory } => Arc::new(FileKeyStore::new(directory)?),
    };
    tracing::info!(backend = store.backend_name(), "key version store ready");
    Ok(store)
}
