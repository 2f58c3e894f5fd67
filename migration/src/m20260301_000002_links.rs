//! links 表
//!
//! slug 上的唯一索引覆盖已软删除的行，所以被删除链接的 slug 不会被再次分配。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Links::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Links::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Links::Slug)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Links::TargetUrl).text().not_null())
                    .col(
                        ColumnDef::new(Links::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Links::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Links::ClickLimit).big_integer().null())
                    .col(
                        ColumnDef::new(Links::ClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Links::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    // 外部身份系统签发的 owner ID，不对 users 建外键
                    .col(ColumnDef::new(Links::UserId).big_integer().null())
                    .to_owned(),
            )
            .await?;

        // 归属查询：WHERE user_id = ? AND deleted_at IS NULL ORDER BY created_at DESC
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_links_user_created")
                    .table(Links::Table)
                    .col(Links::UserId)
                    .col(Links::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // 过期清扫
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_links_expires_at")
                    .table(Links::Table)
                    .col(Links::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_links_deleted_at")
                    .table(Links::Table)
                    .col(Links::DeletedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_links_deleted_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_links_expires_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_links_user_created").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Links::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Links {
    #[sea_orm(iden = "links")]
    Table,
    Id,
    Slug,
    TargetUrl,
    CreatedAt,
    ExpiresAt,
    ClickLimit,
    ClickCount,
    DeletedAt,
    UserId,
}
