// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use leadrs::domain::models::account::{Account, AccountRole};
use leadrs::domain::models::job::Job;
use leadrs::domain::repositories::account_repository::AccountRepository;
use leadrs::domain::repositories::job_repository::JobRepository;
use leadrs::domain::repositories::notification_repository::NotificationRepository;
use leadrs::domain::services::conversation_service::ConversationService;
use leadrs::domain::services::job_service::JobService;
use leadrs::domain::services::ledger_service::LedgerService;
use leadrs::domain::services::lead_service::LeadService;
use leadrs::domain::services::moderation::{ModerationFilter, WordListFilter};
use leadrs::domain::services::notification_service::NotificationService;
use leadrs::domain::services::reward_service::RewardService;
use leadrs::infrastructure::events::conversation_bus::ConversationEventBus;
use leadrs::infrastructure::repositories::account_repo_impl::AccountRepositoryImpl;
use leadrs::infrastructure::repositories::conversation_repo_impl::ConversationRepositoryImpl;
use leadrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use leadrs::infrastructure::repositories::notification_repo_impl::NotificationRepositoryImpl;
use leadrs::infrastructure::repositories::reward_repo_impl::RewardRepositoryImpl;
use leadrs::infrastructure::services::outbox_notifier::OutboxNotifier;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use uuid::Uuid;

/// 测试环境
///
/// 内存 SQLite 上的完整服务栈；SQLite 是单写者，
/// 单连接池让并发用例在存储层自然串行化
#[allow(dead_code)]
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub accounts: Arc<AccountRepositoryImpl>,
    pub jobs: Arc<JobRepositoryImpl>,
    pub conversations: Arc<ConversationRepositoryImpl>,
    pub notifications: Arc<NotificationRepositoryImpl>,
    pub ledger_service: Arc<LedgerService>,
    pub lead_service: Arc<LeadService>,
    pub conversation_service: Arc<ConversationService>,
    pub reward_service: Arc<RewardService>,
    pub job_service: Arc<JobService>,
    pub event_bus: Arc<ConversationEventBus>,
}

pub async fn create_test_app() -> TestApp {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .expect("in-memory sqlite should connect");
    Migrator::up(&db, None)
        .await
        .expect("migrations should apply");
    let db = Arc::new(db);

    let accounts = Arc::new(AccountRepositoryImpl::new(db.clone()));
    let jobs = Arc::new(JobRepositoryImpl::new(db.clone()));
    let conversations = Arc::new(ConversationRepositoryImpl::new(db.clone()));
    let rewards = Arc::new(RewardRepositoryImpl::new(db.clone()));
    let notifications = Arc::new(NotificationRepositoryImpl::new(db.clone()));

    let notifier: Arc<dyn NotificationService> =
        Arc::new(OutboxNotifier::new(notifications.clone()));
    let moderation: Arc<dyn ModerationFilter> =
        Arc::new(WordListFilter::from_words(&["blockedword".to_string()]));
    let event_bus = Arc::new(ConversationEventBus::new());

    let ledger_service = Arc::new(LedgerService::new(db.clone(), accounts.clone()));
    let lead_service = Arc::new(LeadService::new(
        db.clone(),
        jobs.clone(),
        accounts.clone(),
        conversations.clone(),
        notifier.clone(),
    ));
    let conversation_service = Arc::new(ConversationService::new(
        db.clone(),
        conversations.clone(),
        notifier.clone(),
        moderation.clone(),
        event_bus.clone(),
    ));
    let reward_service = Arc::new(RewardService::new(
        db.clone(),
        accounts.clone(),
        rewards.clone(),
        notifier.clone(),
    ));
    let job_service = Arc::new(JobService::new(
        db.clone(),
        jobs.clone(),
        accounts.clone(),
        moderation.clone(),
    ));

    TestApp {
        db,
        accounts,
        jobs,
        conversations,
        notifications,
        ledger_service,
        lead_service,
        conversation_service,
        reward_service,
        job_service,
        event_bus,
    }
}

/// 创建测试账户
pub async fn seed_account(
    app: &TestApp,
    role: AccountRole,
    credits: i64,
    reward_points: i64,
) -> Account {
    let account = Account {
        id: Uuid::new_v4(),
        role,
        display_name: format!("test-{}", role),
        credits,
        reward_points,
        score: 0,
        badge: None,
        active: true,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    };
    app.accounts
        .create(&account)
        .await
        .expect("account seed should insert")
}

/// 创建开放状态的测试工作
pub async fn seed_job(app: &TestApp, owner_id: Uuid, is_emergency: bool) -> Job {
    let job = Job::new(
        owner_id,
        "Fix the back fence".to_string(),
        "Two panels came loose in the storm".to_string(),
        is_emergency,
    );
    app.jobs.create(&job).await.expect("job seed should insert")
}

/// 某账户的发件箱通知（测试断言用）
pub async fn outbox_for(
    app: &TestApp,
    account_id: Uuid,
) -> Vec<leadrs::domain::models::notification::NotificationEvent> {
    app.notifications
        .find_pending(100)
        .await
        .expect("outbox query should succeed")
        .into_iter()
        .filter(|event| event.account_id == account_id)
        .collect()
}
