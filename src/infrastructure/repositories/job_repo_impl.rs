// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::job::{Job, JobStatus};
use crate::domain::repositories::job_repository::{JobRepository, JobRepositoryError};
use crate::infrastructure::database::entities::job as job_entity;

/// 工作仓库实现
///
/// 基于SeaORM实现的工作数据访问层。分配路径依赖行级锁：
/// 购买事务先锁定工作行再检查与写入，并发购买在存储层排队。
#[derive(Clone)]
pub struct JobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobRepositoryImpl {
    /// 创建新的工作仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<job_entity::Model> for Job {
    fn from(model: job_entity::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            title: model.title,
            description: model.description,
            is_emergency: model.is_emergency,
            status: JobStatus::from_str(&model.status).unwrap_or_default(),
            assigned_tradie_id: model.assigned_tradie_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<Job> for job_entity::ActiveModel {
    fn from(job: Job) -> Self {
        Self {
            id: Set(job.id),
            owner_id: Set(job.owner_id),
            title: Set(job.title),
            description: Set(job.description),
            is_emergency: Set(job.is_emergency),
            status: Set(job.status.to_string()),
            assigned_tradie_id: Set(job.assigned_tradie_id),
            created_at: Set(job.created_at),
            updated_at: Set(job.updated_at),
        }
    }
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn create(&self, job: &Job) -> Result<Job, JobRepositoryError> {
        let model: job_entity::ActiveModel = job.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(job.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, JobRepositoryError> {
        let model = job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_id_locked(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> Result<Option<Job>, JobRepositoryError> {
        let mut query = job_entity::Entity::find_by_id(id);

        // SQLite 是单写者，事务本身已串行化，FOR UPDATE 语法不被接受
        if txn.get_database_backend() == DbBackend::Postgres {
            query = query.lock_exclusive();
        }

        let model = query.one(txn).await?;
        Ok(model.map(Into::into))
    }

    async fn assign(
        &self,
        txn: &DatabaseTransaction,
        job_id: Uuid,
        tradie_id: Uuid,
    ) -> Result<Job, JobRepositoryError> {
        // 过滤条件重申分配前置状态；行已持锁，零行受影响即状态已变
        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::AssignedTradieId,
                Expr::value(Some(tradie_id)),
            )
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Assigned.to_string()),
            )
            .col_expr(
                job_entity::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(job_entity::Column::Id.eq(job_id))
            .filter(job_entity::Column::Status.eq(JobStatus::Open.to_string()))
            .filter(job_entity::Column::AssignedTradieId.is_null())
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(JobRepositoryError::NotFound);
        }

        let model = job_entity::Entity::find_by_id(job_id)
            .one(txn)
            .await?
            .ok_or(JobRepositoryError::NotFound)?;
        Ok(model.into())
    }

    async fn mark_completed(
        &self,
        txn: &DatabaseTransaction,
        job_id: Uuid,
    ) -> Result<Job, JobRepositoryError> {
        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Completed.to_string()),
            )
            .col_expr(
                job_entity::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(job_entity::Column::Id.eq(job_id))
            .filter(
                job_entity::Column::Status.is_in(vec![
                    JobStatus::Assigned.to_string(),
                    JobStatus::InProgress.to_string(),
                ]),
            )
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(JobRepositoryError::NotFound);
        }

        let model = job_entity::Entity::find_by_id(job_id)
            .one(txn)
            .await?
            .ok_or(JobRepositoryError::NotFound)?;
        Ok(model.into())
    }

    async fn list_open(&self, limit: u64, offset: u64) -> Result<Vec<Job>, JobRepositoryError> {
        let models = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(JobStatus::Open.to_string()))
            .order_by_desc(job_entity::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Job::from).collect())
    }
}
