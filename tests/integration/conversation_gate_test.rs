// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use leadrs::domain::models::account::AccountRole;
use leadrs::domain::models::conversation::GateState;
use leadrs::domain::models::notification::NotificationKind;
use leadrs::domain::services::conversation_service::ConversationError;

use super::helpers::{create_test_app, outbox_for, seed_account, seed_job};

/// 幂等创建：重复请求返回同一个会话
#[tokio::test]
async fn test_get_or_create_is_idempotent() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 0, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;

    let first = app
        .conversation_service
        .get_or_create(job.id, homeowner.id, tradie.id)
        .await
        .unwrap();
    let second = app
        .conversation_service
        .get_or_create(job.id, homeowner.id, tradie.id)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);

    let all = app
        .conversation_service
        .conversations_for(tradie.id)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

/// 并发创建：M 个并发请求观察到同一个会话，只有一行
#[tokio::test]
async fn test_concurrent_get_or_create_single_row() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 0, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let conversations = app.conversation_service.clone();
        let (job_id, homeowner_id, tradie_id) = (job.id, homeowner.id, tradie.id);
        handles.push(tokio::spawn(async move {
            conversations
                .get_or_create(job_id, homeowner_id, tradie_id)
                .await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let all = app
        .conversation_service
        .conversations_for(tradie.id)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

/// 回复门控：技工消息保持等待；业主首条消息永久开放
#[tokio::test]
async fn test_gate_opens_on_homeowner_reply_and_stays_open() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 0, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;

    let conversation = app
        .conversation_service
        .get_or_create(job.id, homeowner.id, tradie.id)
        .await
        .unwrap();

    assert_eq!(
        app.conversation_service
            .gate_state(conversation.id)
            .await
            .unwrap(),
        GateState::AwaitingReply
    );

    app.conversation_service
        .post_message(conversation.id, tradie.id, Some("G'day, saw your job".into()), None)
        .await
        .unwrap();
    assert_eq!(
        app.conversation_service
            .gate_state(conversation.id)
            .await
            .unwrap(),
        GateState::AwaitingReply
    );

    app.conversation_service
        .post_message(conversation.id, homeowner.id, Some("Thanks for reaching out".into()), None)
        .await
        .unwrap();
    assert_eq!(
        app.conversation_service
            .gate_state(conversation.id)
            .await
            .unwrap(),
        GateState::Open
    );

    // 后续技工消息不会让门控回退
    app.conversation_service
        .post_message(conversation.id, tradie.id, Some("When suits?".into()), None)
        .await
        .unwrap();
    assert_eq!(
        app.conversation_service
            .gate_state(conversation.id)
            .await
            .unwrap(),
        GateState::Open
    );
}

/// 空消息被拒绝；只带附件的消息可以通过
#[tokio::test]
async fn test_empty_message_rejected_attachment_only_allowed() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 0, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;

    let conversation = app
        .conversation_service
        .get_or_create(job.id, homeowner.id, tradie.id)
        .await
        .unwrap();

    let result = app
        .conversation_service
        .post_message(conversation.id, tradie.id, None, None)
        .await;
    assert!(matches!(result, Err(ConversationError::EmptyMessage)));

    let result = app
        .conversation_service
        .post_message(conversation.id, tradie.id, Some("   ".into()), None)
        .await;
    assert!(matches!(result, Err(ConversationError::EmptyMessage)));

    let message = app
        .conversation_service
        .post_message(
            conversation.id,
            tradie.id,
            None,
            Some("https://storage.example.com/quote.pdf".into()),
        )
        .await
        .unwrap();
    assert!(message.body.is_none());
    assert!(message.attachment_url.is_some());
}

/// 非参与者不能发消息
#[tokio::test]
async fn test_outsider_cannot_post() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 0, 0).await;
    let outsider = seed_account(&app, AccountRole::Tradie, 0, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;

    let conversation = app
        .conversation_service
        .get_or_create(job.id, homeowner.id, tradie.id)
        .await
        .unwrap();

    let result = app
        .conversation_service
        .post_message(conversation.id, outsider.id, Some("let me in".into()), None)
        .await;
    assert!(matches!(result, Err(ConversationError::NotParticipant)));
}

/// 消息顺序：序号由存储分配，按追加顺序单调递增
#[tokio::test]
async fn test_message_ordering_is_storage_assigned() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 0, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;

    let conversation = app
        .conversation_service
        .get_or_create(job.id, homeowner.id, tradie.id)
        .await
        .unwrap();

    for text in ["first", "second", "third"] {
        app.conversation_service
            .post_message(conversation.id, tradie.id, Some(text.into()), None)
            .await
            .unwrap();
    }

    let messages = app
        .conversation_service
        .list_messages(conversation.id)
        .await
        .unwrap();
    let seqs: Vec<i64> = messages.iter().map(|m| m.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
    assert_eq!(messages[0].body.as_deref(), Some("first"));
    assert_eq!(messages[2].body.as_deref(), Some("third"));
}

/// 每条消息都为对端产生一条通知
#[tokio::test]
async fn test_messages_notify_counterpart() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 0, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;

    let conversation = app
        .conversation_service
        .get_or_create(job.id, homeowner.id, tradie.id)
        .await
        .unwrap();

    app.conversation_service
        .post_message(conversation.id, tradie.id, Some("hello".into()), None)
        .await
        .unwrap();

    let homeowner_events = outbox_for(&app, homeowner.id).await;
    assert_eq!(homeowner_events.len(), 1);
    assert_eq!(homeowner_events[0].event_type, NotificationKind::NewMessage);

    app.conversation_service
        .post_message(conversation.id, homeowner.id, Some("hi".into()), None)
        .await
        .unwrap();

    let tradie_events = outbox_for(&app, tradie.id).await;
    assert_eq!(tradie_events.len(), 1);
    assert_eq!(tradie_events[0].event_type, NotificationKind::NewMessage);
}

/// 审查兜底：配置词表中的词被拒绝
#[tokio::test]
async fn test_moderation_rejects_blocked_word() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 0, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;

    let conversation = app
        .conversation_service
        .get_or_create(job.id, homeowner.id, tradie.id)
        .await
        .unwrap();

    let result = app
        .conversation_service
        .post_message(
            conversation.id,
            tradie.id,
            Some("this contains blockedword here".into()),
            None,
        )
        .await;
    assert!(matches!(result, Err(ConversationError::Rejected)));
}

/// 实时事件：提交后的消息发布到会话订阅者
#[tokio::test]
async fn test_message_appended_event_published() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 0, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;

    let conversation = app
        .conversation_service
        .get_or_create(job.id, homeowner.id, tradie.id)
        .await
        .unwrap();

    let mut rx = app.conversation_service.subscribe(conversation.id);

    let posted = app
        .conversation_service
        .post_message(conversation.id, tradie.id, Some("realtime".into()), None)
        .await
        .unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event.conversation_id, conversation.id);
    assert_eq!(event.message.id, posted.id);
}
