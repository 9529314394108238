//! 通用模块：配置、密钥材料和密钥名称

pub mod config;
pub mod key;
pub mod key_name;

pub use self::config::{ConfigFile, KeyManagementConfig, ProviderConfig};
pub use self::key::{KEY_SIZE, KeyMaterial};
pub use self::key_name::{CascadeKeyNames, KeyName};
