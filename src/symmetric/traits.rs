use crate::symmetric::errors::BlockCipherError;

/// 分组密码适配器的公共特征。
///
/// 每个实现包装一个 CBC + PKCS#7 的分组密码，输入输出均为 `IV || ciphertext`
/// 格式的原始字节。实现必须是纯函数：除返回值外没有副作用。
pub trait BlockCipherSystem {
    /// 算法名称，仅用于日志。
    const NAME: &'static str;

    /// 密钥的期望长度（以字节为单位）。
    const KEY_SIZE: usize = 32;

    /// 分组长度，同时也是 IV 的长度。
    fn block_size() -> usize;

    /// 使用新的随机 IV 加密数据，返回 `IV || ciphertext`。
    fn encrypt_block(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, BlockCipherError>;

    /// 读取前缀 IV 并解密，返回明文。
    fn decrypt_block(ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>, BlockCipherError>;

    /// 在调用任何密码原语之前检查密钥长度。
    fn check_key(key: &[u8]) -> Result<(), BlockCipherError> {
        if key.len() != Self::KEY_SIZE {
            return Err(BlockCipherError::InvalidKeySize {
                expected: Self::KEY_SIZE,
                actual: key.len(),
            });
        }
        Ok(())
    }
}
