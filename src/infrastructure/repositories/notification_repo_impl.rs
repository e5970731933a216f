// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::models::notification::{NotificationEvent, NotificationKind, NotificationStatus};
use crate::domain::repositories::notification_repository::{
    NotificationRepository, NotificationRepositoryError,
};
use crate::infrastructure::database::entities::notification;

/// 通知发件箱仓库实现
pub struct NotificationRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepositoryImpl {
    /// 创建新的通知仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<notification::Model> for NotificationEvent {
    fn from(model: notification::Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            event_type: NotificationKind::from_str(&model.event_type)
                .unwrap_or(NotificationKind::NewMessage),
            payload: model.payload,
            status: NotificationStatus::from_str(&model.status).unwrap_or_default(),
            attempt_count: model.attempt_count,
            max_retries: model.max_retries,
            response_status: model.response_status,
            error_message: model.error_message,
            next_retry_at: model.next_retry_at.map(Into::into),
            created_at: model.created_at.into(),
            delivered_at: model.delivered_at.map(Into::into),
        }
    }
}

impl From<&NotificationEvent> for notification::ActiveModel {
    fn from(event: &NotificationEvent) -> Self {
        Self {
            id: Set(event.id),
            account_id: Set(event.account_id),
            event_type: Set(event.event_type.to_string()),
            payload: Set(event.payload.clone()),
            status: Set(event.status.to_string()),
            attempt_count: Set(event.attempt_count),
            max_retries: Set(event.max_retries),
            next_retry_at: Set(event.next_retry_at.map(Into::into)),
            delivered_at: Set(event.delivered_at.map(Into::into)),
            response_status: Set(event.response_status),
            error_message: Set(event.error_message.clone()),
            created_at: Set(event.created_at.into()),
        }
    }
}

#[async_trait]
impl NotificationRepository for NotificationRepositoryImpl {
    async fn enqueue(
        &self,
        txn: &DatabaseTransaction,
        event: &NotificationEvent,
    ) -> Result<(), NotificationRepositoryError> {
        let model: notification::ActiveModel = event.into();
        model.insert(txn).await?;
        Ok(())
    }

    async fn find_pending(
        &self,
        limit: u64,
    ) -> Result<Vec<NotificationEvent>, NotificationRepositoryError> {
        let now = Utc::now();
        let models = notification::Entity::find()
            .filter(
                Condition::any()
                    .add(
                        notification::Column::Status
                            .eq(NotificationStatus::Pending.to_string()),
                    )
                    .add(
                        Condition::all()
                            .add(
                                notification::Column::Status
                                    .eq(NotificationStatus::Failed.to_string()),
                            )
                            .add(notification::Column::NextRetryAt.lte(now)),
                    ),
            )
            .order_by_asc(notification::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, event: &NotificationEvent) -> Result<(), NotificationRepositoryError> {
        let model: notification::ActiveModel = event.into();
        model.update(self.db.as_ref()).await?;
        Ok(())
    }
}
