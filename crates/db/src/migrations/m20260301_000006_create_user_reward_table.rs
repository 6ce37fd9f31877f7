//! Create `user_reward` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserReward::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserReward::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserReward::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(UserReward::RewardId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(UserReward::ClaimedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_reward_user")
                            .from(UserReward::Table, UserReward::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_reward_reward")
                            .from(UserReward::Table, UserReward::RewardId)
                            .to(Reward::Table, Reward::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, reward_id) - one claim per user per reward
        manager
            .create_index(
                Index::create()
                    .name("idx_user_reward_user_reward")
                    .table(UserReward::Table)
                    .col(UserReward::UserId)
                    .col(UserReward::RewardId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: reward_id (claim counts per reward)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_reward_reward_id")
                    .table(UserReward::Table)
                    .col(UserReward::RewardId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserReward::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserReward {
    Table,
    Id,
    UserId,
    RewardId,
    ClaimedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Reward {
    Table,
    Id,
}
