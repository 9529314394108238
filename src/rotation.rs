pub mod manager;

pub use manager::KeyLifecycleManager;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// 密钥轮换策略，定义了密钥版本的生命周期。
///
/// 进程级配置，启动时加载后不可变。`key_retention_period_days` 应当大于
/// `key_rotation_threshold_days`，否则旧版本可能在仍需解密时被清理。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RotationPolicy {
    /// 当前版本的最大存活天数，超过后铸造新版本。
    #[serde(default = "default_rotation_threshold_days")]
    pub key_rotation_threshold_days: u32,
    /// 任何版本的最大保留天数，超过后可以删除，并不再参与解密。
    #[serde(default = "default_retention_period_days")]
    pub key_retention_period_days: u32,
    /// 解密路径是否也执行轮换检查。
    #[serde(default = "default_rotate_on_decrypt")]
    pub rotate_on_decrypt: bool,
}

fn default_rotation_threshold_days() -> u32 {
    90
}

fn default_retention_period_days() -> u32 {
    365
}

fn default_rotate_on_decrypt() -> bool {
    true
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            key_rotation_threshold_days: default_rotation_threshold_days(),
            key_retention_period_days: default_retention_period_days(),
            rotate_on_decrypt: default_rotate_on_decrypt(),
        }
    }
}

impl RotationPolicy {
    pub fn rotation_threshold(&self) -> Duration {
        Duration::days(i64::from(self.key_rotation_threshold_days))
    }

    pub fn retention_period(&self) -> Duration {
        Duration::days(i64::from(self.key_retention_period_days))
    }

    /// 版本年龄达到阈值即需要轮换。
    pub fn is_rotation_due(&self, age: Duration) -> bool {
        age >= self.rotation_threshold()
    }

    /// 版本年龄严格超过保留期即视为退役。
    pub fn is_retired(&self, age: Duration) -> bool {
        age > self.retention_period()
    }
}
