//!
//! 端到端测试：字符串接口、base64 以及损坏检测
//!

mod common;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use cascade_seal::prelude::*;
use common::memory_seal;

#[tokio::test]
async fn test_hello_world_scenario() {
    let (_, seal) = memory_seal(RotationPolicy::default());

    let ciphertext = seal
        .encrypt_cascade("hello world", "k1", "k1", "k1")
        .await
        .unwrap();
    assert!(!ciphertext.is_empty());
    assert!(STANDARD.decode(&ciphertext).is_ok());

    let plaintext = seal
        .decrypt_cascade(&ciphertext, "k1", "k1", "k1")
        .await
        .unwrap();
    assert_eq!(plaintext, "hello world");

    // 单名称形式与三名称形式互通
    assert_eq!(seal.decrypt(&ciphertext, "k1").await.unwrap(), "hello world");
}

#[tokio::test]
async fn test_single_byte_corruption_never_yields_plaintext() {
    let (_, seal) = memory_seal(RotationPolicy::default());
    let ciphertext = seal.encrypt("hello world", "k1").await.unwrap();
    let raw = STANDARD.decode(&ciphertext).unwrap();

    for i in 0..raw.len() {
        let mut corrupted = raw.clone();
        corrupted[i] = corrupted[i].wrapping_add(1);
        let result = seal.decrypt(&STANDARD.encode(&corrupted), "k1").await;
        assert!(
            matches!(
                result,
                Err(Error::AllCandidatesExhausted { .. }) | Err(Error::DecryptionFailed)
            ),
            "corruption at byte {i} produced {result:?}"
        );
    }
}

#[tokio::test]
async fn test_invalid_input() {
    let (store, seal) = memory_seal(RotationPolicy::default());

    assert!(matches!(seal.encrypt("", "k1").await, Err(Error::InvalidInput(_))));
    assert!(matches!(seal.encrypt("x", "1bad").await, Err(Error::InvalidInput(_))));
    assert!(matches!(seal.encrypt("x", &"a".repeat(128)).await, Err(Error::InvalidInput(_))));
    assert!(matches!(seal.decrypt("not base64!", "k1").await, Err(Error::InvalidInput(_))));
    assert!(store.is_empty());

    // 127 个字符是允许的最大长度
    assert!(seal.encrypt("x", &"a".repeat(127)).await.is_ok());
}

#[tokio::test]
async fn test_unknown_name_cannot_decrypt() {
    let (_, seal) = memory_seal(RotationPolicy::default());
    let ciphertext = seal.encrypt("payload", "owner").await.unwrap();

    assert!(matches!(
        seal.decrypt(&ciphertext, "stranger").await,
        Err(Error::AllCandidatesExhausted { attempts: 1 })
    ));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_version() {
    let (store, seal) = memory_seal(RotationPolicy::default());
    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..16 {
        let seal = seal.clone();
        tasks.spawn(async move {
            let text = format!("message {i}");
            let ciphertext = seal.encrypt(&text, "shared").await.unwrap();
            (text, ciphertext)
        });
    }

    let mut results = Vec::new();
    while let Some(result) = tasks.join_next().await {
        results.push(result.unwrap());
    }
    // 并发首次使用时可能有多个调用方同时铸造 v1，只有一个写入成功
    assert_eq!(store.len(), 1);
    for (text, ciphertext) in results {
        assert_eq!(seal.decrypt(&ciphertext, "shared").await.unwrap(), text);
    }
}

#[tokio::test]
async fn test_from_config_memory_provider() {
    let config = ConfigFile::from_json(r#"{"key_management": {"provider": "memory"}}"#).unwrap();
    let seal = CascadeSeal::from_config(&config).unwrap();

    let ciphertext = seal.encrypt("configured", "k1").await.unwrap();
    assert_eq!(seal.decrypt(&ciphertext, "k1").await.unwrap(), "configured");
    assert_eq!(seal.manager().store().backend_name(), "memory");
}

#[test]
fn test_from_config_rejects_missing_provider() {
    assert!(matches!(
        ConfigFile::from_json(r#"{"key_management": {}}"#),
        Err(Error::Configuration(_))
    ));
}
