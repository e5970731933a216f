// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::presentation::handlers::{
    account_handler, conversation_handler, job_handler, lead_handler, payment_handler,
    reward_handler,
};
use axum::{
    routing::{get, post},
    Router,
};

/// 创建受保护路由
///
/// 身份与速率限制中间件在装配时由 main 叠加
///
/// # 返回值
///
/// 返回配置好的路由
pub fn protected_routes() -> Router {
    Router::new()
        .route("/v1/jobs", post(job_handler::create_job))
        .route("/v1/jobs", get(job_handler::list_jobs))
        .route("/v1/jobs/{id}", get(job_handler::get_job))
        .route("/v1/jobs/{id}/complete", post(job_handler::complete_job))
        .route(
            "/v1/leads/{job_id}/purchase",
            post(lead_handler::purchase_lead),
        )
        .route(
            "/v1/conversations",
            get(conversation_handler::list_conversations),
        )
        .route(
            "/v1/conversations/{id}",
            get(conversation_handler::get_conversation),
        )
        .route(
            "/v1/conversations/{id}/messages",
            get(conversation_handler::list_messages).post(conversation_handler::post_message),
        )
        .route(
            "/v1/conversations/{id}/gate",
            get(conversation_handler::gate_state),
        )
        .route(
            "/v1/conversations/{id}/events",
            get(conversation_handler::conversation_events),
        )
        .route("/v1/account/balance", get(account_handler::get_balance))
        .route("/v1/account/ledger", get(account_handler::get_ledger))
        .route("/v1/rewards", get(reward_handler::list_rewards))
        .route("/v1/rewards/redeem", post(reward_handler::redeem))
        .route(
            "/v1/rewards/redemptions",
            get(reward_handler::list_redemptions),
        )
        .route("/v1/leaderboard", get(reward_handler::leaderboard))
        .route("/v1/reviews", post(reward_handler::submit_review))
}

/// 创建公开路由
///
/// 健康检查、版本信息与支付处理器回调；支付回调以签名而不是
/// 账户身份验证
pub fn public_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version))
        .route(
            "/v1/payments/confirmation",
            post(payment_handler::payment_confirmation),
        )
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
