// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::Extension;
use axum::Router;
use axum_test::TestServer;
use hmac::{Hmac, Mac};
use leadrs::config::settings::{
    DatabaseSettings, MetricsSettings, ModerationSettings, PaymentSettings, PayoutSettings,
    PushSettings, RateLimitingSettings, RedisSettings, ServerSettings, Settings,
};
use leadrs::domain::models::account::AccountRole;
use leadrs::presentation::middleware::identity_middleware::{identity_middleware, IdentityState};
use leadrs::presentation::routes;
use sha2::Sha256;
use std::sync::Arc;
use uuid::Uuid;

use super::helpers::{create_test_app, seed_account, seed_job, TestApp};

const PAYMENT_SECRET: &str = "test-payment-secret";

fn test_settings() -> Settings {
    Settings {
        database: DatabaseSettings {
            url: "sqlite::memory:".into(),
            max_connections: Some(1),
            min_connections: None,
            connect_timeout: None,
            idle_timeout: None,
        },
        redis: RedisSettings {
            url: "redis://localhost:6379".into(),
        },
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        rate_limiting: RateLimitingSettings {
            enabled: false,
            default_rpm: 100,
        },
        push: PushSettings {
            gateway_url: "http://localhost:8800/push".into(),
            secret: "push-secret".into(),
        },
        payment: PaymentSettings {
            webhook_secret: PAYMENT_SECRET.into(),
        },
        payout: PayoutSettings {
            check_interval: 3600,
        },
        moderation: ModerationSettings {
            blocked_words: vec![],
        },
        metrics: MetricsSettings {
            listen_addr: "127.0.0.1:0".into(),
        },
    }
}

/// 测试服务器：真实路由与身份中间件，省略需要 Redis 的限流层
fn create_http_server(app: &TestApp) -> TestServer {
    let identity_state = IdentityState { db: app.db.clone() };

    let protected = routes::protected_routes().layer(axum::middleware::from_fn_with_state(
        identity_state,
        identity_middleware,
    ));

    let router = Router::new()
        .merge(routes::public_routes())
        .merge(protected)
        .layer(Extension(app.job_service.clone()))
        .layer(Extension(app.lead_service.clone()))
        .layer(Extension(app.conversation_service.clone()))
        .layer(Extension(app.ledger_service.clone()))
        .layer(Extension(app.reward_service.clone()))
        .layer(Extension(Arc::new(test_settings())));

    TestServer::new(router).expect("test server should start")
}

#[tokio::test]
async fn test_health_is_public() {
    let app = create_test_app().await;
    let server = create_http_server(&app);

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), "OK");
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = create_test_app().await;
    let server = create_http_server(&app);

    let response = server.get("/v1/account/balance").await;
    assert_eq!(response.status_code(), 401);

    let response = server
        .get("/v1/account/balance")
        .add_header("X-Account-Id", Uuid::new_v4().to_string())
        .await;
    assert_eq!(response.status_code(), 401);
}

/// 购买接口：成功 201，重复 409，余额不足 402，消息明确
#[tokio::test]
async fn test_purchase_endpoint_status_codes() {
    let app = create_test_app().await;
    let server = create_http_server(&app);

    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let rich = seed_account(&app, AccountRole::Tradie, 20, 0).await;
    let poor = seed_account(&app, AccountRole::Tradie, 1, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;

    let response = server
        .post(&format!("/v1/leads/{}/purchase", job.id))
        .add_header("X-Account-Id", rich.id.to_string())
        .await;
    assert_eq!(response.status_code(), 201);
    let body: serde_json::Value = response.json();
    assert!(body["conversation_id"].is_string());

    let response = server
        .post(&format!("/v1/leads/{}/purchase", job.id))
        .add_header("X-Account-Id", rich.id.to_string())
        .await;
    assert_eq!(response.status_code(), 409);

    let other_job = seed_job(&app, homeowner.id, false).await;
    let response = server
        .post(&format!("/v1/leads/{}/purchase", other_job.id))
        .add_header("X-Account-Id", poor.id.to_string())
        .await;
    assert_eq!(response.status_code(), 402);
    let body: serde_json::Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Insufficient credits"));
}

#[tokio::test]
async fn test_tradie_cannot_post_jobs() {
    let app = create_test_app().await;
    let server = create_http_server(&app);
    let tradie = seed_account(&app, AccountRole::Tradie, 0, 0).await;

    let response = server
        .post("/v1/jobs")
        .add_header("X-Account-Id", tradie.id.to_string())
        .json(&serde_json::json!({
            "title": "Paint the fence",
            "description": "White, two coats",
        }))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_empty_message_is_bad_request() {
    let app = create_test_app().await;
    let server = create_http_server(&app);

    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 20, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;
    let conversation = app
        .conversation_service
        .get_or_create(job.id, homeowner.id, tradie.id)
        .await
        .unwrap();

    let response = server
        .post(&format!("/v1/conversations/{}/messages", conversation.id))
        .add_header("X-Account-Id", tradie.id.to_string())
        .json(&serde_json::json!({}))
        .await;
    assert_eq!(response.status_code(), 400);
}

/// 支付回调：签名正确入账，签名错误 401，重复确认不重复入账
#[tokio::test]
async fn test_payment_confirmation_signature_and_idempotency() {
    let app = create_test_app().await;
    let server = create_http_server(&app);
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;

    let payload = serde_json::json!({
        "account_id": homeowner.id,
        "amount": 40,
        "payment_ref": Uuid::new_v4(),
    });
    let body = serde_json::to_vec(&payload).unwrap();

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(PAYMENT_SECRET.as_bytes()).unwrap();
    mac.update(&body);
    let signature = hex::encode(mac.finalize().into_bytes());

    let response = server
        .post("/v1/payments/confirmation")
        .add_header("X-Payment-Signature", signature.clone())
        .add_header("Content-Type", "application/json")
        .bytes(body.clone().into())
        .await;
    assert_eq!(response.status_code(), 200);

    // 重复确认：成功但不重复入账
    let response = server
        .post("/v1/payments/confirmation")
        .add_header("X-Payment-Signature", signature)
        .add_header("Content-Type", "application/json")
        .bytes(body.clone().into())
        .await;
    assert_eq!(response.status_code(), 200);

    let account = app.ledger_service.account(homeowner.id).await.unwrap();
    assert_eq!(account.credits, 40);

    // 签名错误被拒绝
    let response = server
        .post("/v1/payments/confirmation")
        .add_header("X-Payment-Signature", "deadbeef")
        .add_header("Content-Type", "application/json")
        .bytes(body.into())
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_gate_endpoint_reports_state() {
    let app = create_test_app().await;
    let server = create_http_server(&app);

    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 20, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;
    let conversation = app
        .conversation_service
        .get_or_create(job.id, homeowner.id, tradie.id)
        .await
        .unwrap();

    let response = server
        .get(&format!("/v1/conversations/{}/gate", conversation.id))
        .add_header("X-Account-Id", tradie.id.to_string())
        .await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["gate_state"], "awaiting_reply");

    app.conversation_service
        .post_message(conversation.id, homeowner.id, Some("hello".into()), None)
        .await
        .unwrap();

    let response = server
        .get(&format!("/v1/conversations/{}/gate", conversation.id))
        .add_header("X-Account-Id", tradie.id.to_string())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["gate_state"], "open");
}
