// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use uuid::Uuid;

use crate::domain::models::notification::NotificationKind;

/// 通知分发特质
///
/// 核心操作通过该接口登记带外推送通知。对核心而言是
/// fire-and-forget：登记失败只记录日志，绝不向触发操作
/// 传播错误，也不回滚已完成的状态变更。
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// 登记一条通知
    ///
    /// # 参数
    ///
    /// * `txn` - 触发操作已打开的事务，通知随之一起提交
    /// * `account_id` - 接收方账户
    /// * `kind` - 事件类型
    /// * `payload` - 事件负载
    async fn notify(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        kind: NotificationKind,
        payload: serde_json::Value,
    );
}
