//! SeaORM relational store
//!
//! Supports SQLite, MySQL/MariaDB and PostgreSQL. Records live in
//! `short_urls` (unique on `original_url`), ownership and per-owner deletion
//! state in `user_urls`.

mod connection;
mod converters;
mod mutations;
mod query;

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use super::RecordStore;
use super::models::{OwnerId, Record, Stats};
use crate::errors::{Result, ShortenerError};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{model_to_record, ownership_active_model, record_to_active_model};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(ShortenerError::config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 规范化 backend 名称
pub fn normalize_backend_name(backend: &str) -> String {
    match backend {
        "mariadb" => "mysql".to_string(),
        "postgresql" => "postgres".to_string(),
        other => other.to_string(),
    }
}

pub struct RelationalStore {
    db: DatabaseConnection,
    backend_name: String,
    /// 进程内串行化复合写操作
    op_lock: tokio::sync::Mutex<()>,
    closed: AtomicBool,
}

impl RelationalStore {
    /// 连接数据库并运行迁移
    pub async fn connect(database_url: &str, pool_size: u32) -> Result<Self> {
        if database_url.is_empty() {
            return Err(ShortenerError::config("storage.database_url 未设置"));
        }

        let backend_name = normalize_backend_name(&infer_backend_from_url(database_url)?);

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url, pool_size).await?
        } else {
            connect_generic(database_url, &backend_name, pool_size).await?
        };

        run_migrations(&db).await?;

        info!("{} storage initialized", backend_name.to_uppercase());
        Ok(Self {
            db,
            backend_name,
            op_lock: tokio::sync::Mutex::new(()),
            closed: AtomicBool::new(false),
        })
    }

    /// 实际数据库类型：sqlite / mysql / postgres
    pub fn database_kind(&self) -> &str {
        &self.backend_name
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(ShortenerError::backend_unavailable(format!(
                "{} storage is closed",
                self.backend_name
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for RelationalStore {
    async fn add(&self, record: &Record, owner: OwnerId) -> Result<()> {
        self.ensure_open()?;
        self.insert(record, owner).await
    }

    async fn add_batch(&self, records: &[Record], owner: OwnerId) -> Result<()> {
        self.ensure_open()?;
        self.insert_batch(records, owner).await
    }

    async fn read(&self, alias: &str) -> Result<Record> {
        self.ensure_open()?;
        self.get(alias).await
    }

    async fn read_by_original_url(&self, original_url: &str) -> Result<Record> {
        self.ensure_open()?;
        self.get_by_url(original_url).await
    }

    async fn read_by_owner(&self, owner: OwnerId) -> Result<Vec<Record>> {
        self.ensure_open()?;
        self.owned_by(owner).await
    }

    async fn is_deleted_for(&self, alias: &str, owner: OwnerId) -> Result<bool> {
        self.ensure_open()?;
        self.deleted_for(alias, owner).await
    }

    async fn soft_delete_many(&self, aliases: &[String], owner: OwnerId) -> Result<()> {
        self.ensure_open()?;
        self.mark_deleted(aliases, owner).await
    }

    async fn stats(&self) -> Result<Stats> {
        self.ensure_open()?;
        self.counts().await
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_open()?;
        self.db.ping().await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        // 等待进行中的写操作结束
        let _guard = self.op_lock.lock().await;
        if let Err(e) = self.db.clone().close().await {
            warn!("Failed to close {} connection pool: {}", self.backend_name, e);
            return Err(e.into());
        }
        info!("{} storage closed", self.backend_name.to_uppercase());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "database"
    }
}
