use thiserror::Error;

/// 单层分组密码适配器的错误类型。
#[derive(Error, Debug)]
pub enum BlockCipherError {
    #[error("Invalid key size: expected {expected}, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },

    #[error("Input is truncated: expected at least {expected} bytes, got {actual}")]
    TruncatedInput { expected: usize, actual: usize },

    #[error("Cipher validation failed")]
    CipherValidationFailed,

    #[error("Random source failed: {0}")]
    RandomSource(#[from] rand_core::OsError),
}
