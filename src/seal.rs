use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::debug;

use crate::cascade::{CandidateSet, CascadeCipher, LayerKeys};
use crate::common::config::ConfigFile;
use crate::common::key::KeyMaterial;
use crate::common::key_name::{CascadeKeyNames, KeyName};
use crate::error::{Error, Result};
use crate::rotation::KeyLifecycleManager;

/// `CascadeSeal` 是 cascade-seal 库的主入口点。
///
/// 它把密钥名称校验、密钥生命周期管理和三层级联加密组合在一起：
/// 加密时为每一层取当前版本的密钥，解密时取保留期内的全部版本并搜索候选组合。
/// 字符串形式的接口输入 UTF-8 明文，输出标准 base64 密文。
///
/// 输入校验（空文本、非法密钥名称、非法 base64）在任何存储访问之前同步完成。
/// 级联运算在 tokio 的阻塞线程池中执行，不会占用异步工作线程。
///
/// ```rust,ignore
/// use cascade_seal::prelude::*;
///
/// let seal = CascadeSeal::from_config(&ConfigFile::new(ProviderConfig::Memory))?;
/// let ciphertext = seal.encrypt("hello world", "k1").await?;
/// assert_eq!(seal.decrypt(&ciphertext, "k1").await?, "hello world");
/// ```
#[derive(Clone)]
pub struct CascadeSeal {
    manager: Arc<KeyLifecycleManager>,
}

impl CascadeSeal {
    pub fn new(manager: Arc<KeyLifecycleManager>) -> Self {
        Self { manager }
    }

    /// 按配置构造存储后端、生命周期管理器和入口。
    pub fn from_config(config: &ConfigFile) -> Result<Self> {
        Ok(Self::new(Arc::new(KeyLifecycleManager::from_config(config)?)))
    }

    pub fn manager(&self) -> &Arc<KeyLifecycleManager> {
        &self.manager
    }

    /// 三层使用同一个逻辑名称加密。
    pub async fn encrypt(&self, plaintext: &str, key_name: &str) -> Result<String> {
        let plaintext = require_text(plaintext, "plaintext")?;
        let names = CascadeKeyNames::uniform(KeyName::parse(key_name)?);
        self.encrypt_bytes(plaintext.as_bytes(), &names)
            .await
            .map(|ciphertext| STANDARD.encode(ciphertext))
    }

    /// 每一层使用各自的逻辑名称加密。
    pub async fn encrypt_cascade(
        &self,
        plaintext: &str,
        twofish: &str,
        serpent: &str,
        aes: &str,
    ) -> Result<String> {
        let plaintext = require_text(plaintext, "plaintext")?;
        let names = CascadeKeyNames::parse(twofish, serpent, aes)?;
        self.encrypt_bytes(plaintext.as_bytes(), &names)
            .await
            .map(|ciphertext| STANDARD.encode(ciphertext))
    }

    pub async fn decrypt(&self, ciphertext: &str, key_name: &str) -> Result<String> {
        let ciphertext = decode_ciphertext(ciphertext)?;
        let names = CascadeKeyNames::uniform(KeyName::parse(key_name)?);
        let plaintext = self.decrypt_bytes(&ciphertext, &names).await?;
        Ok(String::from_utf8(plaintext)?)
    }

    pub async fn decrypt_cascade(
        &self,
        ciphertext: &str,
        twofish: &str,
        serpent: &str,
        aes: &str,
    ) -> Result<String> {
        let ciphertext = decode_ciphertext(ciphertext)?;
        let names = CascadeKeyNames::parse(twofish, serpent, aes)?;
        let plaintext = self.decrypt_bytes(&ciphertext, &names).await?;
        Ok(String::from_utf8(plaintext)?)
    }

    /// 字节级加密，返回原始级联密文（不做 base64）。
    pub async fn encrypt_bytes(&self, plaintext: &[u8], names: &CascadeKeyNames) -> Result<Vec<u8>> {
        if plaintext.is_empty() {
            return Err(Error::InvalidInput("plaintext must not be empty".to_string()));
        }

        let twofish = self.manager.get_encryption_key(&names.twofish).await?;
        let serpent = self.manager.get_encryption_key(&names.serpent).await?;
        let aes = self.manager.get_encryption_key(&names.aes).await?;
        debug!(
            twofish = %names.twofish,
            serpent = %names.serpent,
            aes = %names.aes,
            len = plaintext.len(),
            "encrypting"
        );

        let plaintext = plaintext.to_vec();
        tokio::task::spawn_blocking(move || {
            CascadeCipher::encrypt(&plaintext, &layer_keys(&twofish, &serpent, &aes))
        })
        .await?
    }

    /// 字节级解密，输入原始级联密文。
    ///
    /// 所有候选组合都失败时返回 [`Error::AllCandidatesExhausted`]。
    pub async fn decrypt_bytes(&self, ciphertext: &[u8], names: &CascadeKeyNames) -> Result<Vec<u8>> {
        if ciphertext.is_empty() {
            return Err(Error::InvalidInput("ciphertext must not be empty".to_string()));
        }

        let candidates = CandidateSet::new(
            self.manager.get_decryption_keys(&names.twofish).await?,
            self.manager.get_decryption_keys(&names.serpent).await?,
            self.manager.get_decryption_keys(&names.aes).await?,
        );
        debug!(
            twofish = %names.twofish,
            serpent = %names.serpent,
            aes = %names.aes,
            combinations = candidates.combinations(),
            "decrypting"
        );

        let ciphertext = ciphertext.to_vec();
        tokio::task::spawn_blocking(move || candidates.decrypt(&ciphertext)).await?
    }

    /// 同步加密。
    ///
    /// 在异步上下文之外调用时，内部创建一个单线程运行时驱动异步实现；
    /// 在多线程 tokio 运行时中调用时借用当前运行时（`block_in_place`）；
    /// 在单线程运行时中调用会返回 [`Error::BlockingInAsyncContext`]。
    /// 轮换触发的清理任务随私有运行时一起结束，未完成的删除会在下一次轮换时重试。
    #[deprecated(note = "use the async `encrypt` instead")]
    pub fn encrypt_blocking(&self, plaintext: &str, key_name: &str) -> Result<String> {
        run_blocking(self.encrypt(plaintext, key_name))
    }

    /// 同步的三名称加密，限制同 [`CascadeSeal::encrypt_blocking`]。
    #[deprecated(note = "use the async `encrypt_cascade` instead")]
    pub fn encrypt_cascade_blocking(
        &self,
        plaintext: &str,
        twofish: &str,
        serpent: &str,
        aes: &str,
    ) -> Result<String> {
        run_blocking(self.encrypt_cascade(plaintext, twofish, serpent, aes))
    }

    /// 同步解密，限制同 [`CascadeSeal::encrypt_blocking`]。
    #[deprecated(note = "use the async `decrypt` instead")]
    pub fn decrypt_blocking(&self, ciphertext: &str, key_name: &str) -> Result<String> {
        run_blocking(self.decrypt(ciphertext, key_name))
    }

    /// 同步的三名称解密，限制同 [`CascadeSeal::encrypt_blocking`]。
    #[deprecated(note = "use the async `decrypt_cascade` instead")]
    pub fn decrypt_cascade_blocking(
        &self,
        ciphertext: &str,
        twofish: &str,
        serpent: &str,
        aes: &str,
    ) -> Result<String> {
        run_blocking(self.decrypt_cascade(ciphertext, twofish, serpent, aes))
    }
}

fn layer_keys<'a>(
    twofish: &'a KeyMaterial,
    serpent: &'a KeyMaterial,
    aes: &'a KeyMaterial,
) -> LayerKeys<'a> {
    LayerKeys::new(twofish.as_bytes(), serpent.as_bytes(), aes.as_bytes())
}

fn require_text<'a>(text: &'a str, what: &str) -> Result<&'a str> {
    if text.is_empty() {
        return Err(Error::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(text)
}

fn decode_ciphertext(ciphertext: &str) -> Result<Vec<u8>> {
    let ciphertext = require_text(ciphertext.trim(), "ciphertext")?;
    STANDARD
        .decode(ciphertext)
        .map_err(|e| Error::InvalidInput(format!("ciphertext is not valid base64: {e}")))
}

/// 在同步代码中驱动一个异步操作。
fn run_blocking<T, F>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(future))
        }
        // 单线程运行时无法在阻塞当前线程的同时继续驱动 I/O
        Ok(_) => Err(Error::BlockingInAsyncContext),
        Err(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(future),
    }
}
