//! Traits for abstracting key version storage.
// 中文: 用于抽象密钥版本存储的 Trait。

use crate::storage::{StoreError, StoredVersion};
use async_trait::async_trait;

/// The minimal contract the lifecycle manager needs from a secret store.
///
/// Every backend (in-memory, file system, or a cloud secret manager) implements
/// these four operations. Secrets are addressed by their storage id
/// `"{logical_name}--v{N}"`; payloads are raw key bytes which the backend is
/// responsible for base64-encoding at rest.
///
/// A backend that cannot honor all four loses rotation and/or multi-version
/// decryption but may still serve single-version use.
///
/// 中文: 生命周期管理器对远程密钥存储的最小要求。每个调用都可能挂起等待网络 I/O。
#[async_trait]
pub trait KeyVersionStore: Send + Sync + 'static {
    /// Enumerates every stored version of `logical_name`.
    ///
    /// Only ids that parse as exactly `"{logical_name}--v<N>"` are returned;
    /// the order is unspecified.
    async fn list_versions(&self, logical_name: &str) -> Result<Vec<StoredVersion>, StoreError>;

    /// Fetches and base64-decodes a secret's payload.
    async fn read_secret(&self, storage_id: &str) -> Result<Vec<u8>, StoreError>;

    /// Creates a secret with a base64-encoded payload.
    ///
    /// Writes are create-if-absent: an existing id yields
    /// [`StoreError::AlreadyExists`] and the stored payload is left untouched.
    async fn write_secret(&self, storage_id: &str, secret: &[u8]) -> Result<(), StoreError>;

    /// Deletes a secret. Callers treat this as best-effort.
    async fn delete_secret(&self, storage_id: &str) -> Result<(), StoreError>;

    /// A short backend identifier for logs.
    fn backend_name(&self) -> &'static str;
}
