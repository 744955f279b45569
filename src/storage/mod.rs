//! Record stores
//!
//! Every backend implements [`RecordStore`] with identical semantics:
//! - `add` on a known URL adds the caller's ownership and reports
//!   `AlreadyExists(canonical_alias)`
//! - `add_batch` is all-or-nothing
//! - soft deletes are owner-scoped and never remove a record

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::Result;

pub mod backend;
pub mod journal;
pub mod memory;
pub mod models;

pub use backend::RelationalStore;
pub use journal::JournaledStore;
pub use memory::VolatileStore;
pub use models::{OwnerId, Record, Stats};

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 注册记录；URL 已存在时为调用者补充归属并返回 `AlreadyExists`
    async fn add(&self, record: &Record, owner: OwnerId) -> Result<()>;

    /// 批量注册，要么全部可见要么整体失败
    async fn add_batch(&self, records: &[Record], owner: OwnerId) -> Result<()>;

    async fn read(&self, alias: &str) -> Result<Record>;

    async fn read_by_original_url(&self, original_url: &str) -> Result<Record>;

    /// 用户名下的全部记录，`deleted` 为该用户视角的删除状态
    async fn read_by_owner(&self, owner: OwnerId) -> Result<Vec<Record>>;

    /// 用户是否拥有并已删除该短码
    async fn is_deleted_for(&self, alias: &str, owner: OwnerId) -> Result<bool>;

    /// 软删除；不存在或不属于该用户的短码直接忽略
    async fn soft_delete_many(&self, aliases: &[String], owner: OwnerId) -> Result<()>;

    async fn stats(&self) -> Result<Stats>;

    async fn ping(&self) -> Result<()>;

    /// 释放资源，可重复调用
    async fn close(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

pub struct StorageFactory;

impl StorageFactory {
    /// 按配置创建存储后端，运行期间不可切换
    pub async fn create(config: &StorageConfig) -> Result<Arc<dyn RecordStore>> {
        let store: Arc<dyn RecordStore> = match config.backend {
            StorageBackend::Memory => Arc::new(VolatileStore::new()),
            StorageBackend::Journal => Arc::new(JournaledStore::open(
                Path::new(&config.journal_path),
                config.journal_fsync,
            )?),
            StorageBackend::Database => Arc::new(
                RelationalStore::connect(&config.database_url, config.pool_size).await?,
            ),
        };

        info!("Using storage backend: {}", store.backend_name());
        Ok(store)
    }
}
