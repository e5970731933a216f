// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, DbErr};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::job::Job;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum JobRepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Job not found")]
    NotFound,
}

/// 工作仓库特质
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 创建新工作
    async fn create(&self, job: &Job) -> Result<Job, JobRepositoryError>;

    /// 根据ID查找工作
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, JobRepositoryError>;

    /// 在事务内锁定并读取工作行（SELECT ... FOR UPDATE）
    ///
    /// 持锁期间其他购买请求在此行上排队，购买竞争在存储层互斥
    async fn find_by_id_locked(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> Result<Option<Job>, JobRepositoryError>;

    /// 将已锁定的开放工作分配给技工（open → assigned）
    async fn assign(
        &self,
        txn: &DatabaseTransaction,
        job_id: Uuid,
        tradie_id: Uuid,
    ) -> Result<Job, JobRepositoryError>;

    /// 标记工作完成（由外部工作流触发）
    async fn mark_completed(
        &self,
        txn: &DatabaseTransaction,
        job_id: Uuid,
    ) -> Result<Job, JobRepositoryError>;

    /// 开放工作列表（find-jobs 页面）
    async fn list_open(&self, limit: u64, offset: u64) -> Result<Vec<Job>, JobRepositoryError>;
}
