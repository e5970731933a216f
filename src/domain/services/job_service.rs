// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::models::account::AccountRole;
use crate::domain::models::job::Job;
use crate::domain::models::reward::AccrualReason;
use crate::domain::repositories::account_repository::AccountRepository;
use crate::domain::repositories::job_repository::{JobRepository, JobRepositoryError};
use crate::domain::services::moderation::ModerationFilter;

/// 工作服务错误类型
#[derive(Error, Debug)]
pub enum JobError {
    /// 工作未找到
    #[error("Job not found: {0}")]
    NotFound(Uuid),
    /// 只有业主可以发布工作
    #[error("Only homeowner accounts can post jobs")]
    RoleMismatch,
    /// 只有发布者可以推进该工作
    #[error("Caller does not own this job")]
    NotOwner,
    /// 工作不在可完成状态
    #[error("Job is not in a completable state")]
    NotCompletable,
    /// 内容被审查过滤器拒绝
    #[error("Job content rejected by moderation filter")]
    Rejected,
    /// 存储错误
    #[error("Store error: {0}")]
    Store(#[from] DbErr),
}

/// 工作发布与生命周期入口服务
///
/// 工作状态机的大部分推进由外部工作流界面完成；核心只拥有
/// 发布与完成两个入口，因为它们驱动积分与得分的累积。
pub struct JobService {
    db: Arc<DatabaseConnection>,
    jobs: Arc<dyn JobRepository>,
    accounts: Arc<dyn AccountRepository>,
    moderation: Arc<dyn ModerationFilter>,
}

impl JobService {
    /// 创建新的工作服务实例
    pub fn new(
        db: Arc<DatabaseConnection>,
        jobs: Arc<dyn JobRepository>,
        accounts: Arc<dyn AccountRepository>,
        moderation: Arc<dyn ModerationFilter>,
    ) -> Self {
        Self {
            db,
            jobs,
            accounts,
            moderation,
        }
    }

    /// 发布工作
    ///
    /// 紧急工作为发布者累积积分（固定表值）
    pub async fn post_job(
        &self,
        owner_id: Uuid,
        owner_role: AccountRole,
        title: String,
        description: String,
        is_emergency: bool,
    ) -> Result<Job, JobError> {
        if owner_role != AccountRole::HomeownerResident {
            return Err(JobError::RoleMismatch);
        }

        self.moderation
            .check(&title)
            .and_then(|_| self.moderation.check(&description))
            .map_err(|_| JobError::Rejected)?;

        let job = Job::new(owner_id, title, description, is_emergency);
        self.jobs.create(&job).await.map_err(|e| match e {
            JobRepositoryError::Database(err) => JobError::Store(err),
            JobRepositoryError::NotFound => JobError::NotFound(job.id),
        })?;

        if is_emergency {
            let points = AccrualReason::EmergencyJobPosted.points();
            let accrual = async {
                let txn = self.db.begin().await?;
                self.accounts
                    .credit_points(&txn, owner_id, points)
                    .await
                    .map_err(|e| DbErr::Custom(e.to_string()))?;
                txn.commit().await
            };
            // 积分累积失败不回滚已发布的工作
            if let Err(e) = accrual.await {
                warn!(
                    "Failed to accrue emergency posting points for account {}: {}",
                    owner_id, e
                );
            }
        }

        info!(
            "Job {} posted by {} (emergency: {})",
            job.id, owner_id, is_emergency
        );
        Ok(job)
    }

    /// 完成工作
    ///
    /// 外部工作流在工作收尾时调用。状态推进与双方的累积在
    /// 同一事务内落库：业主获得奖励积分，技工获得排行榜得分。
    pub async fn complete_job(&self, job_id: Uuid, caller_id: Uuid) -> Result<Job, JobError> {
        let job = self
            .jobs
            .find_by_id(job_id)
            .await
            .map_err(|e| match e {
                JobRepositoryError::Database(err) => JobError::Store(err),
                JobRepositoryError::NotFound => JobError::NotFound(job_id),
            })?
            .ok_or(JobError::NotFound(job_id))?;

        if job.owner_id != caller_id {
            return Err(JobError::NotOwner);
        }

        let txn = self.db.begin().await?;

        let completed = self
            .jobs
            .mark_completed(&txn, job_id)
            .await
            .map_err(|e| match e {
                JobRepositoryError::Database(err) => JobError::Store(err),
                JobRepositoryError::NotFound => JobError::NotCompletable,
            })?;

        let points = AccrualReason::JobCompleted.points();
        self.accounts
            .credit_points(&txn, job.owner_id, points)
            .await
            .map_err(|e| DbErr::Custom(e.to_string()))?;

        if let Some(tradie_id) = completed.assigned_tradie_id {
            self.accounts
                .add_score(&txn, tradie_id, points)
                .await
                .map_err(|e| DbErr::Custom(e.to_string()))?;
        }

        txn.commit().await?;

        info!("Job {} completed by owner {}", job_id, caller_id);
        Ok(completed)
    }

    /// 查询工作
    pub async fn find(&self, job_id: Uuid) -> Result<Job, JobError> {
        self.jobs
            .find_by_id(job_id)
            .await
            .map_err(|e| match e {
                JobRepositoryError::Database(err) => JobError::Store(err),
                JobRepositoryError::NotFound => JobError::NotFound(job_id),
            })?
            .ok_or(JobError::NotFound(job_id))
    }

    /// 开放工作列表
    pub async fn list_open(&self, limit: u64, offset: u64) -> Result<Vec<Job>, JobError> {
        self.jobs.list_open(limit, offset).await.map_err(|e| match e {
            JobRepositoryError::Database(err) => JobError::Store(err),
            JobRepositoryError::NotFound => JobError::Store(DbErr::RecordNotFound("jobs".into())),
        })
    }
}
