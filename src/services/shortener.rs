//! URL shortening facade
//!
//! Orchestrates alias generation, the record store and the deletion pipeline
//! for transport-layer callers. Callers should treat
//! `ShortenerError::AlreadyExists(alias)` from [`ShortenerService::create_url`]
//! as "conflict, here is the existing alias".

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use super::deletion::DeletionPipeline;
use super::health::{HealthProbe, StoreHealthProbe};
use crate::codec::{AliasCodec, normalize};
use crate::config::StaticConfig;
use crate::errors::{Result, ShortenerError};
use crate::storage::{OwnerId, Record, RecordStore, Stats};

/// `resolve` 的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub original_url: String,
    /// 请求者本人是否已删除该短码
    pub deleted: bool,
}

pub struct ShortenerService {
    store: Arc<dyn RecordStore>,
    health: Arc<dyn HealthProbe>,
    codec: AliasCodec,
    max_attempts: u32,
    pipeline: DeletionPipeline,
}

impl ShortenerService {
    /// 创建服务并启动删除 worker，必须在 tokio runtime 内调用
    pub fn new(
        store: Arc<dyn RecordStore>,
        health: Arc<dyn HealthProbe>,
        config: &StaticConfig,
    ) -> Self {
        let pipeline = DeletionPipeline::start(Arc::clone(&store), &config.deletion);
        Self {
            store,
            health,
            codec: AliasCodec::new(config.alias.length),
            max_attempts: config.alias.max_attempts.max(1),
            pipeline,
        }
    }

    /// 使用存储后端 ping 作为健康检查
    pub fn with_store(store: Arc<dyn RecordStore>, config: &StaticConfig) -> Self {
        let health = Arc::new(
            StoreHealthProbe::new(Arc::clone(&store))
                .with_timeout(Duration::from_secs(config.storage.ping_timeout_secs)),
        );
        Self::new(store, health, config)
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn pipeline(&self) -> &DeletionPipeline {
        &self.pipeline
    }

    /// 为 URL 注册短码
    ///
    /// 短码被其他 URL 占用时依次加盐重新生成，最多 `max_attempts` 次。
    /// URL 已存在时返回 `AlreadyExists(规范短码)`，同时调用者已获得归属。
    pub async fn create_url(&self, raw_url: &str, owner: OwnerId) -> Result<String> {
        let canonical = normalize(raw_url)?;

        let mut last_alias = String::new();
        for salt in 0..u64::from(self.max_attempts) {
            let alias = self.codec.alias_for(&canonical, salt);
            match self.store.add(&Record::new(&canonical, &alias), owner).await {
                Ok(()) => {
                    info!("Short URL created: {} -> {} (owner {})", alias, canonical, owner);
                    return Ok(alias);
                }
                Err(ShortenerError::AliasCollision(taken)) => {
                    warn!(
                        "Alias '{}' is taken by another URL, regenerating with salt {}",
                        taken,
                        salt + 1
                    );
                    last_alias = taken;
                }
                Err(e) => return Err(e),
            }
        }

        error!(
            "Gave up on {} after {} alias collisions",
            canonical, self.max_attempts
        );
        Err(ShortenerError::alias_collision(last_alias))
    }

    /// 批量注册，返回与输入顺序一致的规范记录
    ///
    /// 已存在的 URL 不视为错误；整批要么全部成功要么全部失败。
    pub async fn create_batch<S: AsRef<str>>(
        &self,
        raw_urls: &[S],
        owner: OwnerId,
    ) -> Result<Vec<Record>> {
        if raw_urls.is_empty() {
            return Ok(Vec::new());
        }

        let canonicals = raw_urls
            .iter()
            .map(|raw| normalize(raw.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut salts = vec![0u64; canonicals.len()];
        let mut records: Vec<Record> = canonicals
            .iter()
            .map(|url| Record::new(url, self.codec.alias_for(url, 0)))
            .collect();

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let taken = match self.store.add_batch(&records, owner).await {
                Ok(()) => break,
                Err(ShortenerError::AliasCollision(taken)) if attempts < self.max_attempts => taken,
                Err(e) => return Err(e),
            };

            // 占用者：存储中已有的记录，否则为本批次中第一个使用该短码的 URL
            let holder = match self.store.read(&taken).await {
                Ok(record) => Some(record.original_url),
                Err(ShortenerError::NotFound(_)) => records
                    .iter()
                    .find(|r| r.alias == taken)
                    .map(|r| r.original_url.clone()),
                Err(e) => return Err(e),
            };

            let mut regenerated = 0usize;
            for (record, salt) in records.iter_mut().zip(salts.iter_mut()) {
                if record.alias == taken && holder.as_deref() != Some(record.original_url.as_str()) {
                    *salt += 1;
                    record.alias = self.codec.alias_for(&record.original_url, *salt);
                    regenerated += 1;
                }
            }

            if regenerated == 0 {
                return Err(ShortenerError::alias_collision(taken));
            }
            warn!(
                "Alias '{}' collided in batch, regenerated {} aliases",
                taken, regenerated
            );
        }

        let mut canonical_records = Vec::with_capacity(canonicals.len());
        for url in &canonicals {
            canonical_records.push(self.store.read_by_original_url(url).await?);
        }

        info!(
            "Batch shortened {} URLs for owner {}",
            canonical_records.len(),
            owner
        );
        Ok(canonical_records)
    }

    /// 解析短码；提供 requester 时返回该用户视角的删除状态
    pub async fn resolve(&self, alias: &str, requester: Option<OwnerId>) -> Result<Resolved> {
        let record = self.store.read(alias).await?;
        let deleted = match requester {
            Some(owner) => self.store.is_deleted_for(alias, owner).await?,
            None => false,
        };

        Ok(Resolved {
            original_url: record.original_url,
            deleted,
        })
    }

    pub async fn list_owned(&self, owner: OwnerId) -> Result<Vec<Record>> {
        self.store.read_by_owner(owner).await
    }

    /// 提交后台删除，立即返回
    pub async fn request_delete(&self, aliases: Vec<String>, owner: OwnerId) -> Result<()> {
        let count = aliases.len();
        if let Err(e) = self.pipeline.submit(aliases, owner).await {
            error!(
                "Failed to queue deletion of {} aliases for owner {}: {}",
                count, owner, e
            );
            return Err(e);
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<Stats> {
        self.store.stats().await
    }

    pub async fn health_check(&self) -> bool {
        match self.health.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Health check failed: {}", e);
                false
            }
        }
    }

    /// 先排空删除队列，再关闭存储
    pub async fn shutdown(&self) -> Result<()> {
        self.pipeline.shutdown().await;
        self.store.close().await?;
        info!("Shortener service shut down");
        Ok(())
    }
}
