// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::models::account::Account, domain::services::lead_service::LeadService,
    presentation::errors::AppError,
};

/// 购买潜在客户
///
/// 技工解锁与业主就某个工作沟通的权利。整个购买是一个
/// 不可分割的单元；响应中的会话即沟通入口。
pub async fn purchase_lead(
    Path(job_id): Path<Uuid>,
    Extension(account): Extension<Account>,
    Extension(leads): Extension<Arc<LeadService>>,
) -> Result<impl IntoResponse, AppError> {
    let conversation = leads.purchase_lead(job_id, account.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "job_id": job_id,
            "conversation_id": conversation.id,
        })),
    ))
}
