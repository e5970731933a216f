// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::services::conversation_service::ConversationError;
use crate::domain::services::job_service::JobError;
use crate::domain::services::ledger_service::LedgerError;
use crate::domain::services::lead_service::LeadError;
use crate::domain::services::reward_service::RewardError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口。
/// 预期中的业务失败（竞争失败、余额不足）映射到明确的状态码
/// 与可操作的消息；瞬时错误重试耗尽后映射到 503。
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_message = self.0.to_string();

        let status = if let Some(e) = self.0.downcast_ref::<LeadError>() {
            match e {
                LeadError::JobNotFound(_) | LeadError::AccountNotFound(_) => StatusCode::NOT_FOUND,
                LeadError::AlreadyAssigned => StatusCode::CONFLICT,
                LeadError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
                LeadError::RoleMismatch => StatusCode::FORBIDDEN,
                LeadError::RetryExhausted => StatusCode::SERVICE_UNAVAILABLE,
                LeadError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else if let Some(e) = self.0.downcast_ref::<LedgerError>() {
            match e {
                LedgerError::AccountNotFound(_) => StatusCode::NOT_FOUND,
                LedgerError::InsufficientCredits { .. } | LedgerError::InsufficientPoints { .. } => {
                    StatusCode::PAYMENT_REQUIRED
                }
                LedgerError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
                LedgerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else if let Some(e) = self.0.downcast_ref::<ConversationError>() {
            match e {
                ConversationError::NotFound(_) => StatusCode::NOT_FOUND,
                ConversationError::EmptyMessage | ConversationError::Rejected => {
                    StatusCode::BAD_REQUEST
                }
                ConversationError::NotParticipant => StatusCode::FORBIDDEN,
                ConversationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else if let Some(e) = self.0.downcast_ref::<JobError>() {
            match e {
                JobError::NotFound(_) => StatusCode::NOT_FOUND,
                JobError::RoleMismatch | JobError::NotOwner => StatusCode::FORBIDDEN,
                JobError::NotCompletable => StatusCode::CONFLICT,
                JobError::Rejected => StatusCode::BAD_REQUEST,
                JobError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else if let Some(e) = self.0.downcast_ref::<RewardError>() {
            match e {
                RewardError::AccountNotFound(_) | RewardError::UnknownReward(_) => {
                    StatusCode::NOT_FOUND
                }
                RewardError::InsufficientPoints { .. } => StatusCode::PAYMENT_REQUIRED,
                RewardError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else if error_message.contains("cannot be empty")
            || error_message.contains("invalid")
            || error_message.contains("required")
            || error_message.contains("must be")
            || error_message.contains("validation")
        {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        // 瞬时错误耗尽重试后对用户只说"请重试"
        let body = if status == StatusCode::SERVICE_UNAVAILABLE {
            Json(json!({ "error": "Service temporarily unavailable, please try again" }))
        } else {
            Json(json!({ "error": error_message }))
        };
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
