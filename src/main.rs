// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::Extension;
use axum::Router;
use leadrs::config::settings::Settings;
use leadrs::domain::services::conversation_service::ConversationService;
use leadrs::domain::services::job_service::JobService;
use leadrs::domain::services::ledger_service::LedgerService;
use leadrs::domain::services::lead_service::LeadService;
use leadrs::domain::services::moderation::{ModerationFilter, WordListFilter};
use leadrs::domain::services::notification_service::NotificationService;
use leadrs::domain::services::reward_service::RewardService;
use leadrs::infrastructure::cache::redis_client::RedisClient;
use leadrs::infrastructure::database::connection;
use leadrs::infrastructure::events::conversation_bus::ConversationEventBus;
use leadrs::infrastructure::repositories::account_repo_impl::AccountRepositoryImpl;
use leadrs::infrastructure::repositories::conversation_repo_impl::ConversationRepositoryImpl;
use leadrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use leadrs::infrastructure::repositories::notification_repo_impl::NotificationRepositoryImpl;
use leadrs::infrastructure::repositories::reward_repo_impl::RewardRepositoryImpl;
use leadrs::infrastructure::services::outbox_notifier::OutboxNotifier;
use leadrs::presentation::middleware::distributed_rate_limit_middleware::distributed_rate_limit_middleware;
use leadrs::presentation::middleware::identity_middleware::{identity_middleware, IdentityState};
use leadrs::presentation::middleware::rate_limit_middleware::RateLimiter;
use leadrs::presentation::routes;
use leadrs::workers::notification_worker::NotificationWorker;
use leadrs::workers::payout_worker::PayoutWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

use leadrs::utils::telemetry;
use migration::{Migrator, MigratorTrait};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting leadrs...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    url::Url::parse(&settings.push.gateway_url)
        .map_err(|e| anyhow::anyhow!("Invalid push gateway URL: {}", e))?;
    info!("Configuration loaded");

    // Initialize Prometheus Metrics
    leadrs::infrastructure::metrics::init_metrics(&settings.metrics.listen_addr);

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    // Run database migrations
    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize Redis Client
    let redis_client = RedisClient::new(&settings.redis.url).await?;
    info!("Redis client initialized");

    // 5. Initialize Rate Limiter
    let rate_limiter = Arc::new(RateLimiter::new(
        redis_client.clone(),
        settings.rate_limiting.default_rpm,
        settings.rate_limiting.enabled,
    ));
    info!("Rate limiter initialized");

    // 6. Initialize Repositories
    let account_repo = Arc::new(AccountRepositoryImpl::new(db.clone()));
    let job_repo = Arc::new(JobRepositoryImpl::new(db.clone()));
    let conversation_repo = Arc::new(ConversationRepositoryImpl::new(db.clone()));
    let reward_repo = Arc::new(RewardRepositoryImpl::new(db.clone()));
    let notification_repo = Arc::new(NotificationRepositoryImpl::new(db.clone()));

    // 7. Initialize Services
    let notifier: Arc<dyn NotificationService> =
        Arc::new(OutboxNotifier::new(notification_repo.clone()));
    let moderation: Arc<dyn ModerationFilter> = Arc::new(WordListFilter::from_words(
        &settings.moderation.blocked_words,
    ));
    let event_bus = Arc::new(ConversationEventBus::new());

    let ledger_service = Arc::new(LedgerService::new(db.clone(), account_repo.clone()));
    let lead_service = Arc::new(LeadService::new(
        db.clone(),
        job_repo.clone(),
        account_repo.clone(),
        conversation_repo.clone(),
        notifier.clone(),
    ));
    let conversation_service = Arc::new(ConversationService::new(
        db.clone(),
        conversation_repo.clone(),
        notifier.clone(),
        moderation.clone(),
        event_bus.clone(),
    ));
    let reward_service = Arc::new(RewardService::new(
        db.clone(),
        account_repo.clone(),
        reward_repo.clone(),
        notifier.clone(),
    ));
    let job_service = Arc::new(JobService::new(
        db.clone(),
        job_repo.clone(),
        account_repo.clone(),
        moderation.clone(),
    ));

    // 8. Start Workers
    let payout_worker = PayoutWorker::new(
        reward_service.clone(),
        redis_client.clone(),
        Duration::from_secs(settings.payout.check_interval),
    );
    payout_worker.start();

    let notification_worker = NotificationWorker::new(
        notification_repo.clone(),
        settings.push.gateway_url.clone(),
        settings.push.secret.clone(),
    );
    tokio::spawn(async move {
        notification_worker.run().await;
    });

    // 9. Setup Identity State
    let identity_state = IdentityState { db: db.clone() };

    // 10. Start HTTP server
    let protected = routes::protected_routes()
        .layer(axum::middleware::from_fn_with_state(
            rate_limiter.clone(),
            distributed_rate_limit_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            identity_state,
            identity_middleware,
        ));

    let app = Router::new()
        .merge(routes::public_routes())
        .merge(protected)
        .layer(Extension(job_service))
        .layer(Extension(lead_service))
        .layer(Extension(conversation_service))
        .layer(Extension(ledger_service))
        .layer(Extension(reward_service))
        .layer(Extension(rate_limiter))
        .layer(Extension(settings.clone()))
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
