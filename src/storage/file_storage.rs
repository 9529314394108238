use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::storage::{
    KeyVersionStore, StoreError, StoredVersion, VersionedName, decode_payload, encode_payload,
};

/// 密钥文件后缀
const SECRET_FILE_SUFFIX: &str = ".secret.json";

/// 写入中的临时文件后缀
const TEMP_FILE_SUFFIX: &str = ".tmp";

/// 进程内临时文件序号
static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// 持久化文件权限（仅 Unix）
#[cfg(unix)]
const SECRET_FILE_MODE: u32 = 0o600;

/// 磁盘上的密钥文档
#[derive(Debug, Serialize, Deserialize)]
struct SecretDocument {
    /// base64 编码的密钥
    value: String,
    created_at: DateTime<Utc>,
}

/// 密钥文件存储
///
/// 每个密钥版本对应目录中的一个 JSON 文件 `{storage_id}.secret.json`。
pub struct FileKeyStore {
    /// 密钥存储目录
    storage_dir: PathBuf,
}

impl FileKeyStore {
    /// 创建新的密钥文件存储，目录不存在时自动创建。
    ///
    /// # 参数
    ///
    /// * `storage_dir` - 存储密钥文件的目录
    pub fn new<P: AsRef<Path>>(storage_dir: P) -> Result<Self, StoreError> {
        let path = storage_dir.as_ref().to_path_buf();

        // 确保目录存在
        std::fs::create_dir_all(&path).map_err(|e| {
            StoreError::from(std::io::Error::new(
                e.kind(),
                format!("无法创建密钥存储目录 {}: {}", path.display(), e),
            ))
        })?;

        Ok(Self { storage_dir: path })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn secret_path(&self, storage_id: &str) -> PathBuf {
        self.storage_dir
            .join(format!("{storage_id}{SECRET_FILE_SUFFIX}"))
    }

    /// 同一目录下唯一的临时文件名，不带 `.secret.json` 后缀，列举时会被忽略。
    fn temp_path(&self, storage_id: &str) -> PathBuf {
        let sequence = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        self.storage_dir.join(format!(
            ".{storage_id}.{}.{}.{sequence}{TEMP_FILE_SUFFIX}",
            std::process::id(),
            Utc::now().timestamp_subsec_nanos()
        ))
    }

    async fn load_document(&self, storage_id: &str) -> Result<SecretDocument, StoreError> {
        let path = self.secret_path(storage_id);
        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(storage_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&json)
            .map_err(|e| StoreError::MalformedPayload(format!("{}: {}", path.display(), e)))
    }
}

/// 创建并完整写入临时文件，落盘后返回。
async fn write_temp(path: &Path, json: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(SECRET_FILE_MODE);

    let mut file = options.open(path).await?;
    file.write_all(json).await?;
    file.sync_all().await
}

#[async_trait]
impl KeyVersionStore for FileKeyStore {
    async fn list_versions(&self, logical_name: &str) -> Result<Vec<StoredVersion>, StoreError> {
        let mut versions = Vec::new();
        let mut entries = fs::read_dir(&self.storage_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(storage_id) = file_name
                .to_str()
                .and_then(|name| name.strip_suffix(SECRET_FILE_SUFFIX))
            else {
                continue;
            };
            let Some(parsed) = VersionedName::parse_for(storage_id, logical_name) else {
                continue;
            };

            // 列举与删除并发时文件可能已经消失
            match self.load_document(storage_id).await {
                Ok(document) => versions.push(StoredVersion {
                    version: parsed.version,
                    created_at: document.created_at,
                    storage_id: storage_id.to_string(),
                }),
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(versions)
    }

    async fn read_secret(&self, storage_id: &str) -> Result<Vec<u8>, StoreError> {
        let document = self.load_document(storage_id).await?;
        decode_payload(storage_id, &document.value)
    }

    async fn write_secret(&self, storage_id: &str, secret: &[u8]) -> Result<(), StoreError> {
        let document = SecretDocument {
            value: encode_payload(secret),
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&document)
            .map_err(|e| StoreError::Backend(format!("序列化密钥文档失败: {e}")))?;

        // 先写完整的临时文件，再用硬链接占用最终文件名：
        // 读者只会看到完整的文档，已存在的版本也不会被覆盖
        let temp_path = self.temp_path(storage_id);
        let result = match write_temp(&temp_path, &json).await {
            Ok(()) => match fs::hard_link(&temp_path, self.secret_path(storage_id)).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    Err(StoreError::AlreadyExists(storage_id.to_string()))
                }
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        };

        if let Err(e) = fs::remove_file(&temp_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %temp_path.display(), error = %e, "failed to remove temporary secret file");
            }
        }
        result
    }

    async fn delete_secret(&self, storage_id: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.secret_path(storage_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(storage_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
