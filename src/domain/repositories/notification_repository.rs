// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, DbErr};
use thiserror::Error;

use crate::domain::models::notification::NotificationEvent;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum NotificationRepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// 通知发件箱仓库特质
///
/// 通知与触发它的状态变更写在同一个事务里，随事务一起提交；
/// 投递由后台工作器异步完成，投递失败永不影响核心操作。
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 在事务内写入待投递通知
    async fn enqueue(
        &self,
        txn: &DatabaseTransaction,
        event: &NotificationEvent,
    ) -> Result<(), NotificationRepositoryError>;

    /// 获取待投递的通知（pending，或到达重试时间的 failed）
    async fn find_pending(
        &self,
        limit: u64,
    ) -> Result<Vec<NotificationEvent>, NotificationRepositoryError>;

    /// 更新通知投递状态
    async fn update(&self, event: &NotificationEvent) -> Result<(), NotificationRepositoryError>;
}
