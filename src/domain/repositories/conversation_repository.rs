// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, DbErr};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::conversation::{Conversation, Message};

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum ConversationRepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Conversation not found")]
    NotFound,
}

/// 会话仓库特质
///
/// (job_id, tradie_id) 的唯一性由存储层约束保证，而不是
/// 应用层检查；并发的创建请求最终观察到同一行。
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// 幂等获取或创建会话
    ///
    /// 基于唯一约束的 insert-on-conflict-do-nothing，冲突后重新
    /// 读取已存在的行；并发调用都会返回同一个会话。
    async fn get_or_create(
        &self,
        txn: &DatabaseTransaction,
        job_id: Uuid,
        homeowner_id: Uuid,
        tradie_id: Uuid,
    ) -> Result<Conversation, ConversationRepositoryError>;

    /// 根据ID查找会话
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conversation>, ConversationRepositoryError>;

    /// 某账户参与的所有会话
    async fn find_by_participant(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Conversation>, ConversationRepositoryError>;

    /// 追加消息
    ///
    /// 在会话行锁下分配会话内单调递增的序号；消息的全序由
    /// 该序号定义，与客户端提交顺序无关。
    async fn append_message(
        &self,
        txn: &DatabaseTransaction,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: Option<String>,
        attachment_url: Option<String>,
    ) -> Result<Message, ConversationRepositoryError>;

    /// 按序号升序读取会话消息
    async fn list_messages(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<Message>, ConversationRepositoryError>;

    /// 会话中是否存在指定账户发出的消息（门控状态计算）
    async fn has_message_from(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
    ) -> Result<bool, ConversationRepositoryError>;
}
