//! 密钥材料
use crate::error::Result;
use rand_core::{OsRng, TryRngCore};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// 256 位密钥的字节长度。
pub const KEY_SIZE: usize = 32;

/// 原始密钥字节，离开作用域时清零。
///
/// `Debug` 只输出指纹，不会泄露密钥本身。
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial(Vec<u8>);

impl KeyMaterial {
    /// 用操作系统随机源生成新的 256 位密钥。
    pub fn generate() -> Result<Self> {
        let mut bytes = vec![0u8; KEY_SIZE];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// 包装从存储中读出的字节。长度在此处不做检查，由级联引擎负责。
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// SHA-256 前 8 字节的十六进制，用于日志。
    pub fn fingerprint(&self) -> String {
        Sha256::digest(&self.0)[..8]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("len", &self.0.len())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}
