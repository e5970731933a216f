// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Query},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    domain::models::account::Account, domain::services::ledger_service::LedgerService,
    presentation::errors::AppError,
};

/// 账本历史查询参数
#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub limit: Option<u32>,
}

/// 当前账户余额
pub async fn get_balance(
    Extension(account): Extension<Account>,
    Extension(ledger): Extension<Arc<LedgerService>>,
) -> Result<impl IntoResponse, AppError> {
    // 中间件注入的快照可能落后于刚完成的变更，重新读取
    let current = ledger.account(account.id).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "account_id": current.id,
        "credits": current.credits,
        "reward_points": current.reward_points,
        "score": current.score,
        "badge": current.badge,
    })))
}

/// 当前账户的账本历史
pub async fn get_ledger(
    Query(query): Query<LedgerQuery>,
    Extension(account): Extension<Account>,
    Extension(ledger): Extension<Arc<LedgerService>>,
) -> Result<impl IntoResponse, AppError> {
    let entries = ledger.history(account.id, query.limit.or(Some(50))).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "entries": entries,
    })))
}
