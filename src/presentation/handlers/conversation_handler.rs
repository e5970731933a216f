// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    Json,
};
use futures::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;
use validator::Validate;

use crate::{
    application::dto::message_request::PostMessageRequestDto,
    domain::models::account::Account,
    domain::services::conversation_service::{ConversationError, ConversationService},
    presentation::errors::AppError,
};

/// 当前账户参与的会话列表
pub async fn list_conversations(
    Extension(account): Extension<Account>,
    Extension(conversations): Extension<Arc<ConversationService>>,
) -> Result<impl IntoResponse, AppError> {
    let mine = conversations.conversations_for(account.id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "conversations": mine,
    })))
}

/// 查询单个会话
pub async fn get_conversation(
    Path(id): Path<Uuid>,
    Extension(account): Extension<Account>,
    Extension(conversations): Extension<Arc<ConversationService>>,
) -> Result<impl IntoResponse, AppError> {
    let conversation = conversations.find(id).await?;
    if !conversation.is_participant(account.id) {
        return Err(ConversationError::NotParticipant.into());
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "conversation": conversation,
    })))
}

/// 按存储顺序读取会话消息
pub async fn list_messages(
    Path(id): Path<Uuid>,
    Extension(account): Extension<Account>,
    Extension(conversations): Extension<Arc<ConversationService>>,
) -> Result<impl IntoResponse, AppError> {
    let conversation = conversations.find(id).await?;
    if !conversation.is_participant(account.id) {
        return Err(ConversationError::NotParticipant.into());
    }

    let messages = conversations.list_messages(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "messages": messages,
    })))
}

/// 发送消息
pub async fn post_message(
    Path(id): Path<Uuid>,
    Extension(account): Extension<Account>,
    Extension(conversations): Extension<Arc<ConversationService>>,
    Json(payload): Json<PostMessageRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let message = conversations
        .post_message(id, account.id, payload.body, payload.attachment_url)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": message,
        })),
    ))
}

/// 查询会话门控状态
pub async fn gate_state(
    Path(id): Path<Uuid>,
    Extension(account): Extension<Account>,
    Extension(conversations): Extension<Arc<ConversationService>>,
) -> Result<impl IntoResponse, AppError> {
    let conversation = conversations.find(id).await?;
    if !conversation.is_participant(account.id) {
        return Err(ConversationError::NotParticipant.into());
    }

    let state = conversations.gate_state(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "gate_state": state,
    })))
}

/// 会话实时事件流（SSE）
///
/// 至少一次投递：滞后导致的缓冲丢弃后，客户端按消息ID去重
/// 并通过消息列表接口补齐
pub async fn conversation_events(
    Path(id): Path<Uuid>,
    Extension(account): Extension<Account>,
    Extension(conversations): Extension<Arc<ConversationService>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let conversation = conversations.find(id).await?;
    if !conversation.is_participant(account.id) {
        return Err(ConversationError::NotParticipant.into());
    }

    let rx = conversations.subscribe(id);
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(appended) => {
                    let event = Event::default()
                        .event("message_appended")
                        .json_data(&appended)
                        .ok()?;
                    return Some((Ok::<_, Infallible>(event), rx));
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
