//!
//! 集成测试的通用辅助函数
//!
#![allow(dead_code)]

use cascade_seal::prelude::*;
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// 按 `RUST_LOG` 安装日志订阅者，只安装一次。
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// 内存存储 + 指定策略的入口。
pub fn memory_seal(policy: RotationPolicy) -> (Arc<InMemoryKeyStore>, CascadeSeal) {
    init_tracing();
    let store = Arc::new(InMemoryKeyStore::new());
    let manager = KeyLifecycleManager::new(store.clone(), policy);
    (store, CascadeSeal::new(Arc::new(manager)))
}

/// 文件存储 + 指定策略的入口。
pub fn file_seal(dir: &std::path::Path, policy: RotationPolicy) -> CascadeSeal {
    init_tracing();
    let store = Arc::new(FileKeyStore::new(dir).unwrap());
    CascadeSeal::new(Arc::new(KeyLifecycleManager::new(store, policy)))
}

/// 不在解密路径上轮换的默认策略。
pub fn read_only_policy() -> RotationPolicy {
    RotationPolicy {
        rotate_on_decrypt: false,
        ..RotationPolicy::default()
    }
}

/// 轮询直到存储中不再有该版本。
pub async fn wait_until_deleted(store: &InMemoryKeyStore, storage_id: &str) {
    for _ in 0..200 {
        if !store.contains(storage_id) {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("{storage_id} was never deleted");
}
