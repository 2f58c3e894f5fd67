//! access_logs 表
//!
//! 每次成功跳转追加一行，只插入不修改。派生字段（设备、浏览器、地区）
//! 查询失败时写入空字符串。

use sea_orm_migration::prelude::*;

use crate::m20260301_000002_links::Links;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccessLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccessLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccessLogs::LinkId).big_integer().not_null())
                    .col(
                        ColumnDef::new(AccessLogs::AccessedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccessLogs::IpAddress)
                            .string_len(45)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AccessLogs::UserAgent)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AccessLogs::Referer)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AccessLogs::Country)
                            .string_len(8)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AccessLogs::City)
                            .string_len(100)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AccessLogs::DeviceType)
                            .string_len(16)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AccessLogs::Browser)
                            .string_len(32)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AccessLogs::Os)
                            .string_len(32)
                            .not_null()
                            .default(""),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_access_logs_link_id")
                            .from(AccessLogs::Table, AccessLogs::LinkId)
                            .to(Links::Table, Links::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 单链接时间序列查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_access_logs_link_time")
                    .table(AccessLogs::Table)
                    .col(AccessLogs::LinkId)
                    .col(AccessLogs::AccessedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_access_logs_accessed_at")
                    .table(AccessLogs::Table)
                    .col(AccessLogs::AccessedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_access_logs_accessed_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_access_logs_link_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AccessLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AccessLogs {
    #[sea_orm(iden = "access_logs")]
    Table,
    Id,
    LinkId,
    AccessedAt,
    IpAddress,
    UserAgent,
    Referer,
    Country,
    City,
    DeviceType,
    Browser,
    Os,
}
