//! 多候选密钥解密策略
//!
//! 级联密文中不记录密钥版本，而三个逻辑名称各自可能保留多个版本。
//! 解密时按 (Twofish × Serpent × AES) 的笛卡尔积逐一尝试，
//! Twofish 在最外层循环、AES 在最内层，第一个成功的组合即为结果。
//! 每个列表都按版本从新到旧排列，所以最常见的情况（全部是当前版本）第一次就命中。
//!
//! 最坏情况需要 |A| × |B| × |C| 次完整的级联解密，列表长度由保留期限制。

use crate::cascade::{CascadeCipher, LayerKeys};
use crate::common::key::KeyMaterial;
use crate::error::{Error, Result};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// 每一层的候选密钥，按版本从新到旧排列。
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub twofish: Vec<Arc<KeyMaterial>>,
    pub serpent: Vec<Arc<KeyMaterial>>,
    pub aes: Vec<Arc<KeyMaterial>>,
}

impl CandidateSet {
    pub fn new(
        twofish: Vec<Arc<KeyMaterial>>,
        serpent: Vec<Arc<KeyMaterial>>,
        aes: Vec<Arc<KeyMaterial>>,
    ) -> Self {
        Self {
            twofish,
            serpent,
            aes,
        }
    }

    /// 笛卡尔积的大小。
    pub fn combinations(&self) -> usize {
        self.twofish.len() * self.serpent.len() * self.aes.len()
    }

    /// 第 `index` 个组合，顺序与三重嵌套循环一致。
    fn keys_at(&self, index: usize) -> LayerKeys<'_> {
        let per_twofish = self.serpent.len() * self.aes.len();
        let twofish = index / per_twofish;
        let serpent = (index / self.aes.len()) % self.serpent.len();
        let aes = index % self.aes.len();
        LayerKeys::new(
            self.twofish[twofish].as_bytes(),
            self.serpent[serpent].as_bytes(),
            self.aes[aes].as_bytes(),
        )
    }

    fn attempt(&self, ciphertext: &[u8], index: usize) -> Option<Vec<u8>> {
        // 单个组合的失败原因不向外暴露
        CascadeCipher::decrypt(ciphertext, &self.keys_at(index)).ok()
    }

    /// 返回第一个能成功解密的组合的明文。
    ///
    /// 全部失败时返回 [`Error::AllCandidatesExhausted`]。
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.is_empty() {
            return Err(Error::EmptyInput);
        }

        let attempts = self.combinations();
        if attempts == 0 {
            return Err(Error::AllCandidatesExhausted { attempts });
        }

        // 快速路径：每层最新的版本
        if let Some(plaintext) = self.attempt(ciphertext, 0) {
            return Ok(plaintext);
        }

        match self.search(ciphertext, attempts) {
            Some(plaintext) => Ok(plaintext),
            None => {
                tracing::debug!(attempts, "no candidate key combination decrypted the input");
                Err(Error::AllCandidatesExhausted { attempts })
            }
        }
    }

    #[cfg(feature = "parallel")]
    fn search(&self, ciphertext: &[u8], attempts: usize) -> Option<Vec<u8>> {
        // find_map_first 保证返回顺序上最靠前的成功组合，与串行搜索结果一致
        (1..attempts)
            .into_par_iter()
            .find_map_first(|index| self.attempt(ciphertext, index))
    }

    #[cfg(not(feature = "parallel"))]
    fn search(&self, ciphertext: &[u8], attempts: usize) -> Option<Vec<u8>> {
        (1..attempts).find_map(|index| self.attempt(ciphertext, index))
    }
}
