// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::domain::models::notification::{NotificationEvent, NotificationKind};
use crate::domain::repositories::notification_repository::NotificationRepository;
use crate::domain::services::notification_service::NotificationService;

/// 发件箱通知分发实现
///
/// 将通知作为发件箱行写入触发操作的事务：状态变更提交则通知
/// 一定入队，状态变更回滚则通知一定不出现。实际投递由
/// NotificationWorker 异步完成。
pub struct OutboxNotifier {
    outbox: Arc<dyn NotificationRepository>,
}

impl OutboxNotifier {
    /// 创建新的发件箱分发器实例
    pub fn new(outbox: Arc<dyn NotificationRepository>) -> Self {
        Self { outbox }
    }
}

#[async_trait]
impl NotificationService for OutboxNotifier {
    async fn notify(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) {
        let event = NotificationEvent::new(account_id, kind, payload);
        // fire-and-forget：入队失败只记录，不向触发操作传播
        if let Err(e) = self.outbox.enqueue(txn, &event).await {
            error!(
                "Failed to enqueue {} notification for account {}: {}",
                kind, account_id, e
            );
        }
    }
}
