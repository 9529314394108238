//! CBC + PKCS#7 分组密码适配器
use crate::symmetric::errors::BlockCipherError;
use crate::symmetric::traits::BlockCipherSystem;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{
    BlockCipher, BlockDecryptMut, BlockEncryptMut, BlockSizeUser, InnerIvInit, KeyInit,
};
use rand_core::{OsRng, TryRngCore};
use std::marker::PhantomData;

/// 可以放入级联中的分组密码。
pub trait NamedBlockCipher: BlockCipher + BlockEncryptMut + BlockDecryptMut + KeyInit {
    const NAME: &'static str;
}

impl NamedBlockCipher for twofish::Twofish {
    const NAME: &'static str = "Twofish-256-CBC";
}

impl NamedBlockCipher for serpent::Serpent {
    const NAME: &'static str = "Serpent-256-CBC";
}

impl NamedBlockCipher for aes::Aes256 {
    const NAME: &'static str = "AES-256-CBC";
}

/// 以 CBC 模式运行任意 [`NamedBlockCipher`] 的适配器。
///
/// 密文格式：`[IV (block_size 字节)][CBC 密文]`。
#[derive(Debug)]
pub struct CbcSystem<C>(PhantomData<C>);

/// 级联的第一层 (A)。
pub type TwofishCbc = CbcSystem<twofish::Twofish>;
/// 级联的第二层 (B)。
pub type SerpentCbc = CbcSystem<serpent::Serpent>;
/// 级联的第三层 (C)。
pub type Aes256Cbc = CbcSystem<aes::Aes256>;

impl<C: NamedBlockCipher> CbcSystem<C> {
    fn init_cipher(key: &[u8]) -> Result<C, BlockCipherError> {
        Self::check_key(key)?;
        C::new_from_slice(key).map_err(|_| BlockCipherError::InvalidKeySize {
            expected: Self::KEY_SIZE,
            actual: key.len(),
        })
    }
}

impl<C: NamedBlockCipher> BlockCipherSystem for CbcSystem<C> {
    const NAME: &'static str = C::NAME;

    fn block_size() -> usize {
        <C as BlockSizeUser>::block_size()
    }

    fn encrypt_block(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, BlockCipherError> {
        let cipher = Self::init_cipher(key)?;

        let mut iv = vec![0u8; Self::block_size()];
        OsRng.try_fill_bytes(&mut iv)?;

        let encryptor = cbc::Encryptor::<C>::inner_iv_slice_init(cipher, &iv)
            .map_err(|_| BlockCipherError::CipherValidationFailed)?;
        let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut output = Vec::with_capacity(iv.len() + ciphertext.len());
        output.extend_from_slice(&iv);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }

    fn decrypt_block(ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>, BlockCipherError> {
        Self::check_key(key)?;
        let block_size = Self::block_size();
        if ciphertext.len() < block_size {
            return Err(BlockCipherError::TruncatedInput {
                expected: block_size,
                actual: ciphertext.len(),
            });
        }

        let cipher = Self::init_cipher(key)?;
        let (iv, body) = ciphertext.split_at(block_size);
        let decryptor = cbc::Decryptor::<C>::inner_iv_slice_init(cipher, iv)
            .map_err(|_| BlockCipherError::CipherValidationFailed)?;

        // 长度不是分组整数倍或填充错误都会在这里失败
        decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(body)
            .map_err(|_| BlockCipherError::CipherValidationFailed)
    }
}
