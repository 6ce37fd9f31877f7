//! Create reward table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reward::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reward::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Reward::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Reward::Description).text().not_null())
                    .col(ColumnDef::new(Reward::PointsRequired).integer().not_null())
                    .col(
                        ColumnDef::new(Reward::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Reward::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: is_active (catalog listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_reward_is_active")
                    .table(Reward::Table)
                    .col(Reward::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reward::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Reward {
    Table,
    Id,
    Title,
    Description,
    PointsRequired,
    IsActive,
    CreatedAt,
}
