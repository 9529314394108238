//! 具体的分组密码系统。

pub mod cbc;

pub use self::cbc::{Aes256Cbc, CbcSystem, SerpentCbc, TwofishCbc};
