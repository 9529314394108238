//! Implements a `KeyVersionStore` that keeps secrets in process memory.

use crate::storage::{
    KeyVersionStore, StoreError, StoredVersion, VersionedName, decode_payload, encode_payload,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

#[derive(Debug, Clone)]
struct MemorySecret {
    value: String,
    created_at: DateTime<Utc>,
}

/// A process-local store. Payloads are kept base64-encoded, as a remote
/// secret manager would keep them.
#[derive(Debug, Default)]
pub struct InMemoryKeyStore {
    secrets: DashMap<String, MemorySecret>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves a secret's creation time `by` into the past.
    ///
    /// Returns `false` if the id is unknown.
    pub fn backdate(&self, storage_id: &str, by: Duration) -> bool {
        match self.secrets.get_mut(storage_id) {
            Some(mut secret) => {
                secret.created_at -= by;
                true
            }
            None => false,
        }
    }

    /// Moves every version of `logical_name` `by` into the past.
    pub fn backdate_all(&self, logical_name: &str, by: Duration) {
        for mut entry in self.secrets.iter_mut() {
            if VersionedName::parse_for(entry.key(), logical_name).is_some() {
                entry.created_at -= by;
            }
        }
    }

    pub fn contains(&self, storage_id: &str) -> bool {
        self.secrets.contains_key(storage_id)
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

#[async_trait]
impl KeyVersionStore for InMemoryKeyStore {
    async fn list_versions(&self, logical_name: &str) -> Result<Vec<StoredVersion>, StoreError> {
        Ok(self
            .secrets
            .iter()
            .filter_map(|entry| {
                VersionedName::parse_for(entry.key(), logical_name).map(|parsed| StoredVersion {
                    version: parsed.version,
                    created_at: entry.created_at,
                    storage_id: entry.key().clone(),
                })
            })
            .collect())
    }

    async fn read_secret(&self, storage_id: &str) -> Result<Vec<u8>, StoreError> {
        let value = self
            .secrets
            .get(storage_id)
            .map(|secret| secret.value.clone())
            .ok_or_else(|| StoreError::NotFound(storage_id.to_string()))?;
        decode_payload(storage_id, &value)
    }

    async fn write_secret(&self, storage_id: &str, secret: &[u8]) -> Result<(), StoreError> {
        match self.secrets.entry(storage_id.to_string()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(storage_id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(MemorySecret {
                    value: encode_payload(secret),
                    created_at: Utc::now(),
                });
                Ok(())
            }
        }
    }

    async fn delete_secret(&self, storage_id: &str) -> Result<(), StoreError> {
        self.secrets
            .remove(storage_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(storage_id.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
