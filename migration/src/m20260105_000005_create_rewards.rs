use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create reward_redemptions table
        manager
            .create_table(
                Table::create()
                    .table(RewardRedemptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RewardRedemptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::AccountId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::RewardId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::PointsCost)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::Status)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reward_redemptions_account")
                    .table(RewardRedemptions::Table)
                    .col(RewardRedemptions::AccountId)
                    .to_owned(),
            )
            .await?;

        // Create payout_runs table
        manager
            .create_table(
                Table::create()
                    .table(PayoutRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PayoutRuns::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PayoutRuns::Period).string().not_null())
                    .col(
                        ColumnDef::new(PayoutRuns::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PayoutRuns::CompletedAt)
                            .timestamp_with_time_zone(),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个周期至多一次发放：唯一约束即互斥
        manager
            .create_index(
                Index::create()
                    .name("uq_payout_runs_period")
                    .table(PayoutRuns::Table)
                    .col(PayoutRuns::Period)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PayoutRuns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RewardRedemptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RewardRedemptions {
    Table,
    Id,
    AccountId,
    RewardId,
    PointsCost,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PayoutRuns {
    Table,
    Id,
    Period,
    StartedAt,
    CompletedAt,
}
