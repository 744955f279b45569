use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 short_urls 表
        manager
            .create_table(
                Table::create()
                    .table(ShortUrl::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShortUrl::Alias)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ShortUrl::OriginalUrl)
                            .string_len(2048)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ShortUrl::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建 user_urls 表，自增 id 记录归属的先后顺序
        manager
            .create_table(
                Table::create()
                    .table(UserUrl::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserUrl::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserUrl::UserId).big_integer().not_null())
                    .col(ColumnDef::new(UserUrl::Alias).string_len(32).not_null())
                    .col(
                        ColumnDef::new(UserUrl::Deleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(UserUrl::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_urls_alias")
                            .from(UserUrl::Table, UserUrl::Alias)
                            .to(ShortUrl::Table, ShortUrl::Alias)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个用户对同一短码只有一条归属
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_urls_owner_alias")
                    .table(UserUrl::Table)
                    .col(UserUrl::UserId)
                    .col(UserUrl::Alias)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 按短码反查归属
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_urls_alias")
                    .table(UserUrl::Table)
                    .col(UserUrl::Alias)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_user_urls_alias").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_user_urls_owner_alias").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserUrl::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ShortUrl::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ShortUrl {
    #[sea_orm(iden = "short_urls")]
    Table,
    Alias,
    OriginalUrl,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserUrl {
    #[sea_orm(iden = "user_urls")]
    Table,
    Id,
    UserId,
    Alias,
    Deleted,
    CreatedAt,
}
