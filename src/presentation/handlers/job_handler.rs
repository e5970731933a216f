// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    application::dto::job_request::{CreateJobRequestDto, JobResponseDto},
    domain::models::account::Account,
    domain::services::job_service::JobService,
    presentation::errors::AppError,
};

/// 列表分页参数
#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// 发布工作
pub async fn create_job(
    Extension(account): Extension<Account>,
    Extension(jobs): Extension<Arc<JobService>>,
    Json(payload): Json<CreateJobRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let job = jobs
        .post_job(
            account.id,
            account.role,
            payload.title,
            payload.description,
            payload.is_emergency,
        )
        .await?;

    let response = JobResponseDto {
        success: true,
        id: job.id,
        status: job.status.to_string(),
        is_emergency: job.is_emergency,
        lead_cost: job.lead_cost(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// 查询单个工作
pub async fn get_job(
    Path(id): Path<Uuid>,
    Extension(jobs): Extension<Arc<JobService>>,
) -> Result<impl IntoResponse, AppError> {
    let job = jobs.find(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "job": job,
    })))
}

/// 开放工作列表（find-jobs 页面数据源）
pub async fn list_jobs(
    Query(query): Query<ListJobsQuery>,
    Extension(jobs): Extension<Arc<JobService>>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit.unwrap_or(20).min(100);
    let offset = query.offset.unwrap_or(0);
    let open_jobs = jobs.list_open(limit, offset).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "jobs": open_jobs,
    })))
}

/// 完成工作
///
/// 外部工作流界面在工作收尾时调用；调用方必须是工作的发布者
pub async fn complete_job(
    Path(id): Path<Uuid>,
    Extension(account): Extension<Account>,
    Extension(jobs): Extension<Arc<JobService>>,
) -> Result<impl IntoResponse, AppError> {
    let job = jobs.complete_job(id, account.id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "id": job.id,
        "status": job.status.to_string(),
    })))
}
