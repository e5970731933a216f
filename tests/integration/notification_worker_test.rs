// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use leadrs::domain::models::notification::{
    NotificationEvent, NotificationKind, NotificationStatus,
};
use leadrs::domain::repositories::notification_repository::NotificationRepository;
use leadrs::workers::notification_worker::NotificationWorker;
use sea_orm::TransactionTrait;
use uuid::Uuid;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::create_test_app;

async fn enqueue_event(app: &super::helpers::TestApp) -> NotificationEvent {
    let event = NotificationEvent::new(
        Uuid::new_v4(),
        NotificationKind::NewMessage,
        serde_json::json!({ "conversation_id": Uuid::new_v4() }),
    );
    let txn = app.db.begin().await.unwrap();
    app.notifications.enqueue(&txn, &event).await.unwrap();
    txn.commit().await.unwrap();
    event
}

/// 成功投递：事件被签名送达并标记为已投递
#[tokio::test]
async fn test_worker_delivers_and_marks_delivered() {
    let app = create_test_app().await;
    let gateway = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/push"))
        .and(header_exists("X-Leadrs-Signature"))
        .and(header_exists("X-Leadrs-Event"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&gateway)
        .await;

    enqueue_event(&app).await;

    let worker = NotificationWorker::new(
        app.notifications.clone(),
        format!("{}/push", gateway.uri()),
        "push-secret".to_string(),
    );
    worker.process_pending().await.unwrap();

    // 投递成功后不再处于待投递状态
    let pending = app.notifications.find_pending(10).await.unwrap();
    assert!(pending.is_empty());
}

/// 网关失败：事件进入失败状态并带下一次重试时间
#[tokio::test]
async fn test_worker_schedules_retry_on_gateway_error() {
    let app = create_test_app().await;
    let gateway = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/push"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&gateway)
        .await;

    let event = enqueue_event(&app).await;

    let worker = NotificationWorker::new(
        app.notifications.clone(),
        format!("{}/push", gateway.uri()),
        "push-secret".to_string(),
    );
    worker.process_pending().await.unwrap();

    // 重试时间在未来，本轮不再取出；直接按ID查行验证状态
    use leadrs::infrastructure::database::entities::notification;
    use sea_orm::EntityTrait;

    let stored: NotificationEvent = notification::Entity::find_by_id(event.id)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .expect("event row should exist")
        .into();

    assert_eq!(stored.status, NotificationStatus::Failed);
    assert!(stored.next_retry_at.is_some());
    assert_eq!(stored.attempt_count, 1);
    assert_eq!(stored.response_status, Some(500));
}

/// 重试预算耗尽：事件进入死信状态，不再被取出
#[tokio::test]
async fn test_worker_dead_letters_after_max_retries() {
    let app = create_test_app().await;
    let gateway = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/push"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&gateway)
        .await;

    let mut event = NotificationEvent::new(
        Uuid::new_v4(),
        NotificationKind::LeadPurchased,
        serde_json::json!({ "job_id": Uuid::new_v4() }),
    );
    // 已到最后一次尝试
    event.max_retries = 1;
    let txn = app.db.begin().await.unwrap();
    app.notifications.enqueue(&txn, &event).await.unwrap();
    txn.commit().await.unwrap();

    let worker = NotificationWorker::new(
        app.notifications.clone(),
        format!("{}/push", gateway.uri()),
        "push-secret".to_string(),
    );
    worker.process_pending().await.unwrap();

    let pending = app.notifications.find_pending(10).await.unwrap();
    assert!(pending.is_empty());
}
