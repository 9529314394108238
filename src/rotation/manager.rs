//! 密钥生命周期管理器
use crate::common::config::ConfigFile;
use crate::common::key::KeyMaterial;
use crate::common::key_name::KeyName;
use crate::error::{Error, Result};
use crate::rotation::RotationPolicy;
use crate::storage::{KeyVersionStore, StoreError, StoredVersion, VersionedName, build_store};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 某个逻辑名称的当前版本。
#[derive(Debug, Clone)]
struct CurrentKey {
    version: u32,
    created_at: DateTime<Utc>,
    key: Arc<KeyMaterial>,
}

/// `KeyLifecycleManager` 负责每个逻辑密钥名称的版本化、轮换和退役。
///
/// 每个逻辑名称都是一个按需创建的小状态机：
/// `无版本 → 有当前版本(v) → {稳定 | 需要轮换}`。
///
/// - 加密总是使用当前版本；没有版本或当前版本超过轮换阈值时铸造新版本。
/// - 解密拿到保留期内的全部版本（从新到旧），由调用方逐一尝试。
/// - 轮换时异步删除超过保留期的旧版本，删除失败只记录日志。
///
/// 管理器持有自己的缓存和策略，由调用方显式构造和注入，不存在进程级单例。
/// 存储后端的故障总是向上传播，绝不会用伪造的密钥兜底。
pub struct KeyLifecycleManager {
    store: Arc<dyn KeyVersionStore>,
    policy: RotationPolicy,
    /// 存储 ID → 密钥。只增不删，退役版本的缓存会保留到进程结束。
    cache: DashMap<String, Arc<KeyMaterial>>,
    /// 逻辑名称 → 当前版本
    current: DashMap<String, CurrentKey>,
}

impl KeyLifecycleManager {
    /// 使用给定的存储后端和轮换策略创建管理器。
    pub fn new(store: Arc<dyn KeyVersionStore>, policy: RotationPolicy) -> Self {
        Self {
            store,
            policy,
            cache: DashMap::new(),
            current: DashMap::new(),
        }
    }

    /// 按配置选择存储后端并创建管理器。
    pub fn from_config(config: &ConfigFile) -> Result<Self> {
        config.validate()?;
        let store = build_store(config.provider())?;
        Ok(Self::new(store, config.rotation_policy().clone()))
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<dyn KeyVersionStore> {
        &self.store
    }

    /// 缓存中记录的当前版本号。
    pub fn current_version(&self, name: &KeyName) -> Option<u32> {
        self.current.get(name.as_str()).map(|entry| entry.version)
    }

    /// 返回用于加密的当前密钥，必要时铸造新版本。
    pub async fn get_encryption_key(&self, name: &KeyName) -> Result<Arc<KeyMaterial>> {
        if let Some(current) = self.fresh_current(name) {
            debug!(key_name = %name, version = current.version, "encryption key served from cache");
            return Ok(current.key);
        }
        Ok(self.ensure_current(name).await?.key)
    }

    /// 返回保留期内的全部密钥，按版本从新到旧排列。
    ///
    /// 若策略允许，解密流量同样会触发轮换检查。
    pub async fn get_decryption_keys(&self, name: &KeyName) -> Result<Vec<Arc<KeyMaterial>>> {
        if self.policy.rotate_on_decrypt && self.fresh_current(name).is_none() {
            self.ensure_current(name).await?;
        }

        let mut versions = self.store.list_versions(name.as_str()).await?;
        if versions.is_empty() {
            return Ok(vec![self.get_encryption_key(name).await?]);
        }
        versions.sort_by(|a, b| b.version.cmp(&a.version));

        let now = Utc::now();
        let newest = versions[0].version;
        let mut keys = Vec::with_capacity(versions.len());
        for version in &versions {
            // 最新版本永远保留，其余超过保留期的版本即使尚未删除也不再参与解密
            if version.version != newest && self.policy.is_retired(version.age_at(now)) {
                debug!(storage_id = %version.storage_id, "skipping retired key version");
                continue;
            }
            match self.load_version(&version.storage_id).await {
                Ok(key) => keys.push(key),
                // 与清理任务并发时版本可能刚被删除
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if keys.is_empty() {
            return Ok(vec![self.get_encryption_key(name).await?]);
        }
        debug!(key_name = %name, candidates = keys.len(), "resolved decryption keys");
        Ok(keys)
    }

    /// 缓存中的当前版本，仅在它尚未到达轮换阈值时返回。
    fn fresh_current(&self, name: &KeyName) -> Option<CurrentKey> {
        let entry = self.current.get(name.as_str())?;
        let age = Utc::now().signed_duration_since(entry.created_at);
        (!self.policy.is_rotation_due(age)).then(|| entry.clone())
    }

    /// 列举版本并执行轮换决策，返回当前版本。
    async fn ensure_current(&self, name: &KeyName) -> Result<CurrentKey> {
        let versions = self.store.list_versions(name.as_str()).await?;
        let now = Utc::now();

        let current = match versions.iter().max_by_key(|v| v.version) {
            None => {
                info!(key_name = %name, "no key versions exist, minting version 1");
                self.mint(name, 1).await?
            }
            Some(latest) if self.policy.is_rotation_due(latest.age_at(now)) => {
                let next = latest.version.checked_add(1).ok_or_else(|| {
                    Error::KeyStoreUnavailable(format!("version numbers exhausted for '{name}'"))
                })?;
                info!(
                    key_name = %name,
                    from_version = latest.version,
                    to_version = next,
                    "rotation threshold reached, minting new key version"
                );
                let minted = self.mint(name, next).await?;
                self.spawn_cleanup(name, &versions, now);
                minted
            }
            Some(latest) => CurrentKey {
                version: latest.version,
                created_at: latest.created_at,
                key: self.load_version(&latest.storage_id).await?,
            },
        };

        self.current.insert(name.as_str().to_string(), current.clone());
        Ok(current)
    }

    /// 生成并持久化新版本。
    ///
    /// 写入是 create-if-absent：并发轮换时落败的一方读取胜者写入的密钥，
    /// 同一版本号绝不会被覆盖。
    async fn mint(&self, name: &KeyName, version: u32) -> Result<CurrentKey> {
        let storage_id = VersionedName::new(name.as_str(), version).storage_id();
        let key = KeyMaterial::generate()?;

        match self.store.write_secret(&storage_id, key.as_bytes()).await {
            Ok(()) => {
                info!(
                    storage_id = %storage_id,
                    fingerprint = %key.fingerprint(),
                    backend = self.store.backend_name(),
                    "minted key version"
                );
                let key = Arc::new(key);
                self.cache.insert(storage_id, Arc::clone(&key));
                Ok(CurrentKey {
                    version,
                    created_at: Utc::now(),
                    key,
                })
            }
            Err(StoreError::AlreadyExists(_)) => {
                info!(storage_id = %storage_id, "key version minted concurrently, adopting existing secret");
                let key = self.load_version(&storage_id).await?;
                // 采用胜者记录的创建时间，当前版本缓存按真实年龄过期
                let created_at = self
                    .store
                    .list_versions(name.as_str())
                    .await?
                    .into_iter()
                    .find(|v| v.version == version)
                    .map_or_else(Utc::now, |v| v.created_at);
                Ok(CurrentKey {
                    version,
                    created_at,
                    key,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 缓存优先读取某个版本的密钥。
    async fn load_version(&self, storage_id: &str) -> std::result::Result<Arc<KeyMaterial>, StoreError> {
        if let Some(key) = self.cache.get(storage_id) {
            return Ok(Arc::clone(key.value()));
        }
        let key = Arc::new(KeyMaterial::from_bytes(self.store.read_secret(storage_id).await?));
        self.cache.insert(storage_id.to_string(), Arc::clone(&key));
        debug!(storage_id, fingerprint = %key.fingerprint(), "fetched key version");
        Ok(key)
    }

    /// 在后台删除超过保留期的版本，调用方不等待结果。
    fn spawn_cleanup(&self, name: &KeyName, versions: &[StoredVersion], now: DateTime<Utc>) {
        let retired: Vec<String> = versions
            .iter()
            .filter(|v| self.policy.is_retired(v.age_at(now)))
            .map(|v| v.storage_id.clone())
            .collect();
        if retired.is_empty() {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(key_name = %name, "no async runtime available, skipping key version cleanup");
            return;
        };

        let store = Arc::clone(&self.store);
        let key_name = name.to_string();
        runtime.spawn(async move {
            for storage_id in retired {
                match store.delete_secret(&storage_id).await {
                    Ok(()) => info!(key_name = %key_name, storage_id = %storage_id, "retired key version"),
                    Err(e) => warn!(
                        key_name = %key_name,
                        storage_id = %storage_id,
                        error = %e,
                        "failed to delete retired key version"
                    ),
                }
            }
        });
    }
}
