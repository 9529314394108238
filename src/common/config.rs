//!
//! # 通用配置模块
//!
//! 包含密钥管理后端的选择和密钥轮换策略。配置在进程启动时加载并校验一次，
//! 此后不可变；缺失必填字段是启动期的致命错误，而不是运行期错误。
//!
use crate::error::{Error, Result};
use crate::rotation::RotationPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 环境变量前缀。
pub const ENV_PREFIX: &str = "CASCADE_SEAL_";

/// 密钥版本存储后端。
///
/// 云端后端通过实现 [`crate::storage::KeyVersionStore`] 接入，不在这里枚举。
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// 进程内存储，重启即丢失。
    Memory,
    /// 每个密钥版本一个 JSON 文件。
    File {
        /// 密钥存储目录
        directory: PathBuf,
    },
}

impl ProviderConfig {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderConfig::Memory => "memory",
            ProviderConfig::File { .. } => "file",
        }
    }
}

/// 密钥管理配置
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KeyManagementConfig {
    #[serde(flatten)]
    pub provider: ProviderConfig,
    /// 轮换配置
    #[serde(default)]
    pub rotation_policy: RotationPolicy,
}

/// 完整配置文件
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConfigFile {
    pub key_management: KeyManagementConfig,
}

impl ConfigFile {
    /// 使用给定后端和默认轮换策略构造配置。
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            key_management: KeyManagementConfig {
                provider,
                rotation_policy: RotationPolicy::default(),
            },
        }
    }

    /// 从 JSON 文件加载配置并校验。
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("无法读取配置文件 {}: {}", path.display(), e))
        })?;
        let config = Self::from_json(&contents)?;
        tracing::debug!(path = %path.display(), provider = config.provider().name(), "loaded configuration");
        Ok(config)
    }

    /// 从 JSON 字符串解析配置并校验。
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ConfigFile = serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("解析配置文件失败: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// 使用环境变量覆盖配置项，然后重新校验。
    ///
    /// - `CASCADE_SEAL_KEY_ROTATION_THRESHOLD_DAYS`
    /// - `CASCADE_SEAL_KEY_RETENTION_PERIOD_DAYS`
    /// - `CASCADE_SEAL_ROTATE_ON_DECRYPT`
    /// - `CASCADE_SEAL_KEY_DIRECTORY`（仅 file 后端）
    pub fn apply_env_overrides(mut self) -> Result<Self> {
        self.apply_overrides(|name| std::env::var(format!("{ENV_PREFIX}{name}")).ok())?;
        self.validate()?;
        Ok(self)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let policy = &mut self.key_management.rotation_policy;

        if let Some(value) = lookup("KEY_ROTATION_THRESHOLD_DAYS") {
            policy.key_rotation_threshold_days = parse_env("KEY_ROTATION_THRESHOLD_DAYS", &value)?;
        }
        if let Some(value) = lookup("KEY_RETENTION_PERIOD_DAYS") {
            policy.key_retention_period_days = parse_env("KEY_RETENTION_PERIOD_DAYS", &value)?;
        }
        if let Some(value) = lookup("ROTATE_ON_DECRYPT") {
            policy.rotate_on_decrypt = value.eq_ignore_ascii_case("true");
        }
        if let Some(value) = lookup("KEY_DIRECTORY") {
            if let ProviderConfig::File { directory } = &mut self.key_management.provider {
                *directory = PathBuf::from(value);
            }
        }
        Ok(())
    }

    /// 校验必填字段。
    pub fn validate(&self) -> Result<()> {
        if let ProviderConfig::File { directory } = &self.key_management.provider {
            if directory.as_os_str().is_empty() {
                return Err(Error::Configuration(
                    "key_management.directory must be set for the file provider".to_string(),
                ));
            }
        }

        let policy = &self.key_management.rotation_policy;
        if policy.key_retention_period_days <= policy.key_rotation_threshold_days {
            // 不强制，但旧版本可能在新版本出现前就被清理
            tracing::warn!(
                rotation_threshold_days = policy.key_rotation_threshold_days,
                retention_period_days = policy.key_retention_period_days,
                "retention period does not exceed rotation threshold; old ciphertext may become undecryptable early"
            );
        }
        Ok(())
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.key_management.provider
    }

    pub fn rotation_policy(&self) -> &RotationPolicy {
        &self.key_management.rotation_policy
    }
}

fn parse_env(name: &str, value: &str) -> Result<u32> {
    value.trim().parse::<u32>().map_err(|e| {
        Error::Configuration(format!("{ENV_PREFIX}{name}={value:?} is not a number of days: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_file_provider_with_defaults() {
        let json = r#"{ "key_management": { "provider": "file", "directory": "/var/lib/keys" } }"#;
        let config = ConfigFile::from_json(json).unwrap();

        assert_eq!(
            config.provider(),
            &ProviderConfig::File { directory: PathBuf::from("/var/lib/keys") }
        );
        assert_eq!(config.rotation_policy(), &RotationPolicy::default());
        assert_eq!(config.rotation_policy().key_rotation_threshold_days, 90);
        assert_eq!(config.rotation_policy().key_retention_period_days, 365);
    }

    #[test]
    fn test_explicit_policy() {
        let json = r#"{
            "key_management": {
                "provider": "memory",
                "rotation_policy": {
                    "key_rotation_threshold_days": 7,
                    "key_retention_period_days": 30,
                    "rotate_on_decrypt": false
                }
            }
        }"#;
        let config = ConfigFile::from_json(json).unwrap();
        assert_eq!(config.provider(), &ProviderConfig::Memory);
        assert_eq!(config.rotation_policy().key_rotation_threshold_days, 7);
        assert_eq!(config.rotation_policy().key_retention_period_days, 30);
        assert!(!config.rotation_policy().rotate_on_decrypt);
    }

    #[test]
    fn test_missing_provider_is_fatal() {
        let json = r#"{ "key_management": { "directory": "/tmp" } }"#;
        assert!(matches!(ConfigFile::from_json(json), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_unknown_provider_is_fatal() {
        let json = r#"{ "key_management": { "provider": "Azure" } }"#;
        assert!(matches!(ConfigFile::from_json(json), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_file_provider_requires_directory() {
        let missing = r#"{ "key_management": { "provider": "file" } }"#;
        assert!(matches!(ConfigFile::from_json(missing), Err(Error::Configuration(_))));

        let empty = r#"{ "key_management": { "provider": "file", "directory": "" } }"#;
        assert!(matches!(ConfigFile::from_json(empty), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_overrides() {
        let mut config = ConfigFile::new(ProviderConfig::File { directory: "./keys".into() });
        let vars: HashMap<&str, &str> = [
            ("KEY_ROTATION_THRESHOLD_DAYS", "1"),
            ("KEY_RETENTION_PERIOD_DAYS", "2"),
            ("ROTATE_ON_DECRYPT", "FALSE"),
            ("KEY_DIRECTORY", "/srv/keys"),
        ]
        .into_iter()
        .collect();

        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        let policy = config.rotation_policy();
        assert_eq!(policy.key_rotation_threshold_days, 1);
        assert_eq!(policy.key_retention_period_days, 2);
        assert!(!policy.rotate_on_decrypt);
        assert_eq!(config.provider(), &ProviderConfig::File { directory: "/srv/keys".into() });
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let mut config = ConfigFile::new(ProviderConfig::Memory);
        let result = config.apply_overrides(|name| {
            (name == "KEY_RETENTION_PERIOD_DAYS").then(|| "forever".to_string())
        });
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_json_roundtrip_shape() {
        let config = ConfigFile::new(ProviderConfig::Memory);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["key_management"]["provider"], "memory");
        assert_eq!(json["key_management"]["rotation_policy"]["key_retention_period_days"], 365);
    }
}
