//! Query operations for RelationalStore
//!
//! This module contains all read-only database operations.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::debug;

use super::RelationalStore;
use super::converters::model_to_record;
use super::mutations::find_ownership;
use crate::errors::{Result, ShortenerError};
use crate::storage::models::{OwnerId, Record, Stats};

use migration::entities::{short_url, user_url};

impl RelationalStore {
    pub(super) async fn get(&self, alias: &str) -> Result<Record> {
        short_url::Entity::find_by_id(alias.to_string())
            .one(&self.db)
            .await?
            .map(model_to_record)
            .ok_or_else(|| ShortenerError::not_found(format!("alias '{}' not found", alias)))
    }

    pub(super) async fn get_by_url(&self, original_url: &str) -> Result<Record> {
        short_url::Entity::find()
            .filter(short_url::Column::OriginalUrl.eq(original_url))
            .one(&self.db)
            .await?
            .map(model_to_record)
            .ok_or_else(|| ShortenerError::not_found(format!("url '{}' not found", original_url)))
    }

    /// 用户名下全部记录，按归属写入顺序
    pub(super) async fn owned_by(&self, owner: OwnerId) -> Result<Vec<Record>> {
        let ownerships = user_url::Entity::find()
            .filter(user_url::Column::UserId.eq(owner))
            .order_by_asc(user_url::Column::Id)
            .all(&self.db)
            .await?;

        if ownerships.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_alias: HashMap<String, short_url::Model> = short_url::Entity::find()
            .filter(
                short_url::Column::Alias
                    .is_in(ownerships.iter().map(|o| o.alias.clone())),
            )
            .all(&self.db)
            .await?
            .into_iter()
            .map(|model| (model.alias.clone(), model))
            .collect();

        let records: Vec<Record> = ownerships
            .into_iter()
            .filter_map(|ownership| {
                by_alias
                    .remove(&ownership.alias)
                    .map(|model| model_to_record(model).with_deleted(ownership.deleted))
            })
            .collect();

        debug!("Loaded {} records for owner {}", records.len(), owner);
        Ok(records)
    }

    pub(super) async fn deleted_for(&self, alias: &str, owner: OwnerId) -> Result<bool> {
        Ok(find_ownership(&self.db, owner, alias)
            .await?
            .is_some_and(|ownership| ownership.deleted))
    }

    /// 记录总数与拥有至少一条记录的用户数
    pub(super) async fn counts(&self) -> Result<Stats> {
        let total_urls = short_url::Entity::find().count(&self.db).await?;
        let total_users = user_url::Entity::find()
            .select_only()
            .column(user_url::Column::UserId)
            .distinct()
            .count(&self.db)
            .await?;

        Ok(Stats {
            total_urls: total_urls as i64,
            total_users: total_users as i64,
        })
    }
}
