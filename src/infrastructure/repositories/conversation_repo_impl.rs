// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::conversation::{Conversation, Message};
use crate::domain::repositories::conversation_repository::{
    ConversationRepository, ConversationRepositoryError,
};
use crate::infrastructure::database::entities::{conversation, message};

/// 会话仓库实现
///
/// 幂等创建建立在 (job_id, tradie_id) 的唯一约束上：插入遇到
/// 冲突时静默跳过并重新读取已存在的行，竞争双方观察到同一会话。
#[derive(Clone)]
pub struct ConversationRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ConversationRepositoryImpl {
    /// 创建新的会话仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<conversation::Model> for Conversation {
    fn from(model: conversation::Model) -> Self {
        Self {
            id: model.id,
            job_id: model.job_id,
            homeowner_id: model.homeowner_id,
            tradie_id: model.tradie_id,
            created_at: model.created_at,
        }
    }
}

impl From<message::Model> for Message {
    fn from(model: message::Model) -> Self {
        Self {
            id: model.id,
            conversation_id: model.conversation_id,
            sender_id: model.sender_id,
            body: model.body,
            attachment_url: model.attachment_url,
            seq: model.seq,
            created_at: model.created_at,
        }
    }
}

#[async_trait]
impl ConversationRepository for ConversationRepositoryImpl {
    async fn get_or_create(
        &self,
        txn: &DatabaseTransaction,
        job_id: Uuid,
        homeowner_id: Uuid,
        tradie_id: Uuid,
    ) -> Result<Conversation, ConversationRepositoryError> {
        let model = conversation::ActiveModel {
            id: Set(Uuid::new_v4()),
            job_id: Set(job_id),
            homeowner_id: Set(homeowner_id),
            tradie_id: Set(tradie_id),
            created_at: Set(Utc::now().fixed_offset()),
        };

        // 冲突即已存在，静默跳过；唯一约束是幂等性的权威来源
        conversation::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    conversation::Column::JobId,
                    conversation::Column::TradieId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(txn)
            .await?;

        let existing = conversation::Entity::find()
            .filter(conversation::Column::JobId.eq(job_id))
            .filter(conversation::Column::TradieId.eq(tradie_id))
            .one(txn)
            .await?
            .ok_or(ConversationRepositoryError::NotFound)?;

        Ok(existing.into())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Conversation>, ConversationRepositoryError> {
        let model = conversation::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_participant(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Conversation>, ConversationRepositoryError> {
        let models = conversation::Entity::find()
            .filter(
                sea_orm::Condition::any()
                    .add(conversation::Column::HomeownerId.eq(account_id))
                    .add(conversation::Column::TradieId.eq(account_id)),
            )
            .order_by_desc(conversation::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn append_message(
        &self,
        txn: &DatabaseTransaction,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: Option<String>,
        attachment_url: Option<String>,
    ) -> Result<Message, ConversationRepositoryError> {
        // 会话行锁串行化序号分配；SQLite 单写者无需显式行锁
        let mut query = conversation::Entity::find_by_id(conversation_id);
        if txn.get_database_backend() == DbBackend::Postgres {
            query = query.lock_exclusive();
        }
        query
            .one(txn)
            .await?
            .ok_or(ConversationRepositoryError::NotFound)?;

        let next_seq = message::Entity::find()
            .filter(message::Column::ConversationId.eq(conversation_id))
            .order_by_desc(message::Column::Seq)
            .one(txn)
            .await?
            .map(|m| m.seq + 1)
            .unwrap_or(1);

        let model = message::ActiveModel {
            id: Set(Uuid::new_v4()),
            conversation_id: Set(conversation_id),
            sender_id: Set(sender_id),
            body: Set(body),
            attachment_url: Set(attachment_url),
            seq: Set(next_seq),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let inserted = model.insert(txn).await?;
        Ok(inserted.into())
    }

    async fn list_messages(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<Message>, ConversationRepositoryError> {
        let models = message::Entity::find()
            .filter(message::Column::ConversationId.eq(conversation_id))
            .order_by_asc(message::Column::Seq)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn has_message_from(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
    ) -> Result<bool, ConversationRepositoryError> {
        let count = message::Entity::find()
            .filter(message::Column::ConversationId.eq(conversation_id))
            .filter(message::Column::SenderId.eq(sender_id))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }
}
