//! Write operations for RelationalStore
//!
//! Each public operation runs inside a single transaction and holds the
//! process-local operation lock for its whole duration.

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, SqlErr,
    TransactionTrait, sea_query::Expr, sea_query::OnConflict,
};
use tracing::{debug, warn};

use super::RelationalStore;
use super::converters::{ownership_active_model, record_to_active_model};
use crate::errors::{Result, ShortenerError};
use crate::storage::models::{OwnerId, Record};

use migration::entities::{short_url, user_url};

/// 单条注册在事务内的结果
struct Registration {
    /// 规范短码
    alias: String,
    created: bool,
}

/// ON CONFLICT DO NOTHING 未插入时各数据库的返回不同
fn is_not_inserted(err: &DbErr) -> bool {
    if matches!(err, DbErr::RecordNotInserted) {
        return true;
    }
    let msg = err.to_string().to_lowercase();
    msg.contains("no rows") || msg.contains("record not inserted")
}

async fn find_by_url<C: ConnectionTrait>(
    conn: &C,
    original_url: &str,
) -> std::result::Result<Option<short_url::Model>, DbErr> {
    short_url::Entity::find()
        .filter(short_url::Column::OriginalUrl.eq(original_url))
        .one(conn)
        .await
}

pub(super) async fn find_ownership<C: ConnectionTrait>(
    conn: &C,
    owner: OwnerId,
    alias: &str,
) -> std::result::Result<Option<user_url::Model>, DbErr> {
    user_url::Entity::find()
        .filter(user_url::Column::UserId.eq(owner))
        .filter(user_url::Column::Alias.eq(alias))
        .one(conn)
        .await
}

/// 插入 short_urls 行，返回插入的短码；URL 已存在时返回 None
///
/// 短码主键冲突（并发写入者抢先占用）映射为 `AliasCollision`。
async fn insert_record<C: ConnectionTrait>(
    conn: &C,
    record: &Record,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    let result = short_url::Entity::insert(record_to_active_model(record, now))
        .on_conflict(
            OnConflict::column(short_url::Column::OriginalUrl)
                .do_nothing()
                .to_owned(),
        )
        .exec(conn)
        .await;

    match result {
        Ok(_) => Ok(Some(record.alias.clone())),
        Err(e) if is_not_inserted(&e) => Ok(None),
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            debug!("alias '{}' taken concurrently: {}", record.alias, e);
            Err(ShortenerError::alias_collision(record.alias.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

/// 在事务内注册一条记录：冲突检查、插入记录、补充归属
async fn register(
    txn: &DatabaseTransaction,
    record: &Record,
    owner: OwnerId,
    now: DateTime<Utc>,
) -> Result<Registration> {
    let (alias, created) = match find_by_url(txn, &record.original_url).await? {
        Some(existing) => (existing.alias, false),
        None => {
            if let Some(holder) = short_url::Entity::find_by_id(record.alias.clone())
                .one(txn)
                .await?
            {
                debug!(
                    "alias '{}' already holds {}, rejecting {}",
                    holder.alias, holder.original_url, record.original_url
                );
                return Err(ShortenerError::alias_collision(record.alias.clone()));
            }

            match insert_record(txn, record, now).await? {
                Some(alias) => (alias, true),
                None => match find_by_url(txn, &record.original_url).await? {
                    // 其他进程抢先写入了同一 URL
                    Some(canonical) => (canonical.alias, false),
                    // 未插入且 URL 不存在：冲突发生在短码上
                    None => return Err(ShortenerError::alias_collision(record.alias.clone())),
                },
            }
        }
    };

    let owned = find_ownership(txn, owner, &alias).await?.is_some();
    if !owned {
        match user_url::Entity::insert(ownership_active_model(owner, &alias, now))
            .on_conflict(
                OnConflict::columns([user_url::Column::UserId, user_url::Column::Alias])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(txn)
            .await
        {
            Ok(_) => {}
            Err(e) if is_not_inserted(&e) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Registration { alias, created })
}

async fn rollback(txn: DatabaseTransaction) {
    if let Err(e) = txn.rollback().await {
        warn!("Rollback failed: {}", e);
    }
}

impl RelationalStore {
    pub(super) async fn insert(&self, record: &Record, owner: OwnerId) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        let txn = self.db.begin().await?;

        let registration = match register(&txn, record, owner, Utc::now()).await {
            Ok(registration) => registration,
            Err(e) => {
                rollback(txn).await;
                return Err(e);
            }
        };
        txn.commit().await?;

        if registration.created {
            debug!("Record created: {} -> {}", registration.alias, record.original_url);
            Ok(())
        } else {
            Err(ShortenerError::already_exists(registration.alias))
        }
    }

    /// 批量注册，任意一条失败则整体回滚
    pub(super) async fn insert_batch(&self, records: &[Record], owner: OwnerId) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let _guard = self.op_lock.lock().await;
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let mut created = 0usize;
        for record in records {
            match register(&txn, record, owner, now).await {
                Ok(registration) => created += usize::from(registration.created),
                Err(e) => {
                    rollback(txn).await;
                    return Err(e);
                }
            }
        }
        txn.commit().await?;

        debug!(
            "Batch registered for owner {}: {} records, {} created",
            owner,
            records.len(),
            created
        );
        Ok(())
    }

    pub(super) async fn mark_deleted(&self, aliases: &[String], owner: OwnerId) -> Result<()> {
        if aliases.is_empty() {
            return Ok(());
        }

        let _guard = self.op_lock.lock().await;
        let result = user_url::Entity::update_many()
            .col_expr(user_url::Column::Deleted, Expr::value(true))
            .filter(user_url::Column::UserId.eq(owner))
            .filter(user_url::Column::Alias.is_in(aliases.iter().cloned()))
            .filter(user_url::Column::Deleted.eq(false))
            .exec(&self.db)
            .await?;

        debug!(
            "Soft deleted for owner {}: requested={} applied={}",
            owner,
            aliases.len(),
            result.rows_affected
        );
        Ok(())
    }
}
