// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::counter;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::conversation::{Conversation, GateState, Message};
use crate::domain::models::notification::NotificationKind;
use crate::domain::repositories::conversation_repository::{
    ConversationRepository, ConversationRepositoryError,
};
use crate::domain::services::moderation::ModerationFilter;
use crate::domain::services::notification_service::NotificationService;
use crate::infrastructure::events::conversation_bus::{ConversationEventBus, MessageAppended};

/// 会话服务错误类型
#[derive(Error, Debug)]
pub enum ConversationError {
    /// 会话未找到
    #[error("Conversation not found: {0}")]
    NotFound(Uuid),
    /// 空消息：正文与附件同时缺失
    #[error("Message must carry a body or an attachment")]
    EmptyMessage,
    /// 发送者不是会话参与者
    #[error("Sender is not a participant of this conversation")]
    NotParticipant,
    /// 内容被审查过滤器拒绝
    #[error("Message rejected by moderation filter")]
    Rejected,
    /// 存储错误
    #[error("Store error: {0}")]
    Store(#[from] DbErr),
}

impl From<ConversationRepositoryError> for ConversationError {
    fn from(err: ConversationRepositoryError) -> Self {
        match err {
            ConversationRepositoryError::Database(e) => ConversationError::Store(e),
            ConversationRepositoryError::NotFound => {
                ConversationError::Store(DbErr::RecordNotFound("conversations".into()))
            }
        }
    }
}

/// 会话门控服务
///
/// 负责会话的幂等创建、消息追加与"回复解锁"规则。会话在
/// 技工解锁潜在客户时创建，初始处于等待回复状态；业主发出
/// 第一条消息后永久开放。
pub struct ConversationService {
    db: Arc<DatabaseConnection>,
    conversations: Arc<dyn ConversationRepository>,
    notifier: Arc<dyn NotificationService>,
    moderation: Arc<dyn ModerationFilter>,
    bus: Arc<ConversationEventBus>,
}

impl ConversationService {
    /// 创建新的会话服务实例
    pub fn new(
        db: Arc<DatabaseConnection>,
        conversations: Arc<dyn ConversationRepository>,
        notifier: Arc<dyn NotificationService>,
        moderation: Arc<dyn ModerationFilter>,
        bus: Arc<ConversationEventBus>,
    ) -> Self {
        Self {
            db,
            conversations,
            notifier,
            moderation,
            bus,
        }
    }

    /// 幂等获取或创建会话
    pub async fn get_or_create(
        &self,
        job_id: Uuid,
        homeowner_id: Uuid,
        tradie_id: Uuid,
    ) -> Result<Conversation, ConversationError> {
        let txn = self.db.begin().await?;
        let conversation = self
            .conversations
            .get_or_create(&txn, job_id, homeowner_id, tradie_id)
            .await?;
        txn.commit().await?;
        Ok(conversation)
    }

    /// 发送消息
    ///
    /// 正文与附件至少其一；附件URL不透明传递，二进制内容
    /// 由外部对象存储负责。消息与发给对端的通知在同一事务内
    /// 提交，提交后向实时订阅者发布 MessageAppended。
    pub async fn post_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: Option<String>,
        attachment_url: Option<String>,
    ) -> Result<Message, ConversationError> {
        let body = body.filter(|b| !b.trim().is_empty());
        if body.is_none() && attachment_url.is_none() {
            return Err(ConversationError::EmptyMessage);
        }

        // 入口已过审查；这里按配置词表兜底复查
        if let Some(text) = &body {
            self.moderation
                .check(text)
                .map_err(|_| ConversationError::Rejected)?;
        }

        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(ConversationError::NotFound(conversation_id))?;

        let counterpart = conversation
            .counterpart_of(sender_id)
            .ok_or(ConversationError::NotParticipant)?;

        let txn = self.db.begin().await?;

        let message = self
            .conversations
            .append_message(&txn, conversation_id, sender_id, body, attachment_url)
            .await?;

        self.notifier
            .notify(
                &txn,
                counterpart,
                NotificationKind::NewMessage,
                json!({
                    "conversation_id": conversation_id,
                    "message_id": message.id,
                    "sender_id": sender_id,
                }),
            )
            .await;

        txn.commit().await?;

        counter!("conversation_messages_total").increment(1);

        self.bus.publish(MessageAppended {
            conversation_id,
            message: message.clone(),
        });

        Ok(message)
    }

    /// 查询会话门控状态
    ///
    /// 业主发出过至少一条消息即为 Open；该转换单向且永久。
    pub async fn gate_state(&self, conversation_id: Uuid) -> Result<GateState, ConversationError> {
        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(ConversationError::NotFound(conversation_id))?;

        let replied = self
            .conversations
            .has_message_from(conversation_id, conversation.homeowner_id)
            .await?;

        Ok(if replied {
            GateState::Open
        } else {
            GateState::AwaitingReply
        })
    }

    /// 按存储顺序读取会话消息
    pub async fn list_messages(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<Message>, ConversationError> {
        if self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .is_none()
        {
            return Err(ConversationError::NotFound(conversation_id));
        }
        Ok(self.conversations.list_messages(conversation_id).await?)
    }

    /// 查找单个会话
    pub async fn find(&self, conversation_id: Uuid) -> Result<Conversation, ConversationError> {
        self.conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(ConversationError::NotFound(conversation_id))
    }

    /// 某账户参与的所有会话
    pub async fn conversations_for(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Conversation>, ConversationError> {
        Ok(self.conversations.find_by_participant(account_id).await?)
    }

    /// 订阅会话的实时消息事件
    pub fn subscribe(
        &self,
        conversation_id: Uuid,
    ) -> tokio::sync::broadcast::Receiver<MessageAppended> {
        self.bus.subscribe(conversation_id)
    }
}
