// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    application::dto::reward_request::{RedeemRequestDto, ReviewSubmittedDto},
    domain::models::account::{Account, AccountRole},
    domain::models::job::JobStatus,
    domain::models::reward::RewardCatalog,
    domain::services::job_service::JobService,
    domain::services::reward_service::RewardService,
    presentation::errors::AppError,
};

/// 奖励目录
pub async fn list_rewards() -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "rewards": RewardCatalog::items(),
    }))
}

/// 兑换奖励
pub async fn redeem(
    Extension(account): Extension<Account>,
    Extension(rewards): Extension<Arc<RewardService>>,
    Json(payload): Json<RedeemRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let record = rewards.redeem(account.id, &payload.reward_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "redemption": record,
        })),
    ))
}

/// 当前账户的兑换历史
pub async fn list_redemptions(
    Extension(account): Extension<Account>,
    Extension(rewards): Extension<Arc<RewardService>>,
) -> Result<impl IntoResponse, AppError> {
    let records = rewards.redemptions(account.id, Some(50)).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "redemptions": records,
    })))
}

/// 当前技工排行榜
pub async fn leaderboard(
    Extension(rewards): Extension<Arc<RewardService>>,
) -> Result<impl IntoResponse, AppError> {
    let standings = rewards.leaderboard(10).await?;

    let entries: Vec<serde_json::Value> = standings
        .iter()
        .map(|account| {
            serde_json::json!({
                "account_id": account.id,
                "display_name": account.display_name,
                "score": account.score,
                "badge": account.badge,
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "success": true,
        "leaderboard": entries,
    })))
}

/// 评价提交入口
///
/// 评价的正文与聚合由外部评价界面持有；核心消费该事件为
/// 评价方累积积分并通知被评价的技工
pub async fn submit_review(
    Extension(account): Extension<Account>,
    Extension(jobs): Extension<Arc<JobService>>,
    Extension(rewards): Extension<Arc<RewardService>>,
    Json(payload): Json<ReviewSubmittedDto>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if account.role != AccountRole::HomeownerResident {
        return Ok((
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "success": false,
                "error": "Only homeowners can submit reviews"
            })),
        )
            .into_response());
    }

    // 防御性校验：评价必须指向自己已完成工作的受雇技工
    let job = jobs.find(payload.job_id).await?;
    if job.owner_id != account.id
        || job.status != JobStatus::Completed
        || job.assigned_tradie_id != Some(payload.tradie_id)
    {
        return Ok((
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "success": false,
                "error": "Review does not match a completed job of this homeowner"
            })),
        )
            .into_response());
    }

    rewards
        .review_submitted(account.id, payload.tradie_id, payload.job_id, payload.rating)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true })),
    )
        .into_response())
}
