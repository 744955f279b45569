use sea_orm::entity::prelude::*;

/// 用户与短码的归属关系，删除状态按用户记录
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "user_urls")]
pub struct Model {
    /// 自增，按归属先后排序
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub alias: String,
    pub deleted: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
