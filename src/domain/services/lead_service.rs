// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::counter;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::models::account::{AccountRole, LedgerReason};
use crate::domain::models::conversation::Conversation;
use crate::domain::models::job::JobStatus;
use crate::domain::models::notification::NotificationKind;
use crate::domain::repositories::account_repository::{AccountRepository, AccountRepositoryError};
use crate::domain::repositories::conversation_repository::{
    ConversationRepository, ConversationRepositoryError,
};
use crate::domain::repositories::job_repository::{JobRepository, JobRepositoryError};
use crate::domain::services::notification_service::NotificationService;
use crate::utils::retry::{is_transient_store_error, store_retry_policy};

/// 潜在客户服务错误类型
#[derive(Error, Debug)]
pub enum LeadError {
    /// 工作未找到
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),
    /// 已被分配（竞争失败方，或对同一技工的重复购买）
    #[error("Job already assigned")]
    AlreadyAssigned,
    /// 账户未找到
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),
    /// 调用方不是技工
    #[error("Only tradie accounts can purchase leads")]
    RoleMismatch,
    /// 信用点不足
    #[error("Insufficient credits: available {available}, required {required}")]
    InsufficientCredits { available: i64, required: i64 },
    /// 瞬时存储错误重试预算耗尽
    #[error("Store conflict retry budget exhausted")]
    RetryExhausted,
    /// 存储错误
    #[error("Store error: {0}")]
    Store(#[from] DbErr),
}

impl From<AccountRepositoryError> for LeadError {
    fn from(err: AccountRepositoryError) -> Self {
        match err {
            AccountRepositoryError::Database(e) => LeadError::Store(e),
            AccountRepositoryError::AccountNotFound(id) => LeadError::AccountNotFound(id),
            AccountRepositoryError::InsufficientCredits {
                available,
                required,
            }
            | AccountRepositoryError::InsufficientPoints {
                available,
                required,
            } => LeadError::InsufficientCredits {
                available,
                required,
            },
            AccountRepositoryError::InvalidAmount(_) => {
                LeadError::Store(DbErr::Custom("invalid debit amount".into()))
            }
        }
    }
}

impl From<JobRepositoryError> for LeadError {
    fn from(err: JobRepositoryError) -> Self {
        match err {
            JobRepositoryError::Database(e) => LeadError::Store(e),
            JobRepositoryError::NotFound => LeadError::AlreadyAssigned,
        }
    }
}

impl From<ConversationRepositoryError> for LeadError {
    fn from(err: ConversationRepositoryError) -> Self {
        match err {
            ConversationRepositoryError::Database(e) => LeadError::Store(e),
            ConversationRepositoryError::NotFound => {
                LeadError::Store(DbErr::RecordNotFound("conversations".into()))
            }
        }
    }
}

/// 潜在客户分配服务
///
/// 将技工的购买请求转换为跨工作、账本和会话的一致状态变更。
/// 整个购买在单个事务内完成：锁定工作行、校验未分配、条件
/// 扣减信用点、写入分配、幂等创建会话、登记通知——任一子步骤
/// 失败则全部回滚，不留下部分分配、部分扣费或孤儿会话。
pub struct LeadService {
    db: Arc<DatabaseConnection>,
    jobs: Arc<dyn JobRepository>,
    accounts: Arc<dyn AccountRepository>,
    conversations: Arc<dyn ConversationRepository>,
    notifier: Arc<dyn NotificationService>,
}

impl LeadService {
    /// 创建新的潜在客户服务实例
    pub fn new(
        db: Arc<DatabaseConnection>,
        jobs: Arc<dyn JobRepository>,
        accounts: Arc<dyn AccountRepository>,
        conversations: Arc<dyn ConversationRepository>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            db,
            jobs,
            accounts,
            conversations,
            notifier,
        }
    }

    /// 购买潜在客户
    ///
    /// 成功时返回已创建（或已存在）的会话。竞争失败方收到
    /// `AlreadyAssigned`；余额不足收到 `InsufficientCredits`，
    /// 两者都不产生任何状态变更。瞬时存储错误在有界退避预算内
    /// 自动重试，预算耗尽后以 `RetryExhausted` 浮出。
    pub async fn purchase_lead(
        &self,
        job_id: Uuid,
        tradie_id: Uuid,
    ) -> Result<Conversation, LeadError> {
        let result = backoff::future::retry(store_retry_policy(), || async move {
            match self.try_purchase(job_id, tradie_id).await {
                Err(LeadError::Store(e)) if is_transient_store_error(&e) => {
                    warn!(
                        "Transient store error during lead purchase for job {}: {}",
                        job_id, e
                    );
                    Err(backoff::Error::transient(LeadError::Store(e)))
                }
                other => other.map_err(backoff::Error::permanent),
            }
        })
        .await;

        match &result {
            Ok(_) => counter!("lead_purchase_total", "outcome" => "success").increment(1),
            Err(LeadError::AlreadyAssigned) => {
                counter!("lead_purchase_total", "outcome" => "already_assigned").increment(1)
            }
            Err(LeadError::InsufficientCredits { .. }) => {
                counter!("lead_purchase_total", "outcome" => "insufficient_credits").increment(1)
            }
            Err(_) => counter!("lead_purchase_total", "outcome" => "error").increment(1),
        }

        // 退避预算耗尽时最后一个瞬时错误原样返回，这里归一化
        result.map_err(|e| match e {
            LeadError::Store(ref err) if is_transient_store_error(err) => LeadError::RetryExhausted,
            other => other,
        })
    }

    async fn try_purchase(
        &self,
        job_id: Uuid,
        tradie_id: Uuid,
    ) -> Result<Conversation, LeadError> {
        let tradie = self
            .accounts
            .find_by_id(tradie_id)
            .await?
            .ok_or(LeadError::AccountNotFound(tradie_id))?;
        if tradie.role != AccountRole::Tradie || !tradie.active {
            return Err(LeadError::RoleMismatch);
        }

        let txn = self.db.begin().await?;

        // 行锁使并发购买在此排队；锁释放后败者看到已分配的工作
        let job = self
            .jobs
            .find_by_id_locked(&txn, job_id)
            .await?
            .ok_or(LeadError::JobNotFound(job_id))?;

        if job.assigned_tradie_id.is_some() || job.status != JobStatus::Open {
            txn.rollback().await?;
            return Err(LeadError::AlreadyAssigned);
        }

        let cost = job.lead_cost();

        self.accounts
            .debit_credits(
                &txn,
                tradie_id,
                cost,
                LedgerReason::LeadPurchase,
                Some(job_id),
            )
            .await
            .map_err(LeadError::from)?;

        self.jobs.assign(&txn, job_id, tradie_id).await?;

        let conversation = self
            .conversations
            .get_or_create(&txn, job_id, job.owner_id, tradie_id)
            .await?;

        self.notifier
            .notify(
                &txn,
                job.owner_id,
                NotificationKind::LeadPurchased,
                json!({
                    "job_id": job_id,
                    "tradie_id": tradie_id,
                    "conversation_id": conversation.id,
                }),
            )
            .await;

        txn.commit().await?;

        info!(
            "Lead for job {} sold to tradie {} for {} credits",
            job_id, tradie_id, cost
        );

        Ok(conversation)
    }
}
