use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create notifications outbox table
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::AccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(Notifications::EventType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notifications::Payload).json().not_null())
                    .col(ColumnDef::new(Notifications::Status).string().not_null())
                    .col(
                        ColumnDef::new(Notifications::AttemptCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Notifications::MaxRetries)
                            .integer()
                            .not_null()
                            .default(5),
                    )
                    .col(
                        ColumnDef::new(Notifications::NextRetryAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(Notifications::DeliveredAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(ColumnDef::new(Notifications::ResponseStatus).integer())
                    .col(ColumnDef::new(Notifications::ErrorMessage).text())
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
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
                    .name("idx_notifications_status_retry")
                    .table(Notifications::Table)
                    .col(Notifications::Status)
                    .col(Notifications::NextRetryAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    AccountId,
    EventType,
    Payload,
    Status,
    AttemptCount,
    MaxRetries,
    NextRetryAt,
    DeliveredAt,
    ResponseStatus,
    ErrorMessage,
    CreatedAt,
}
