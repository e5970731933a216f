// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use leadrs::domain::models::account::{AccountRole, BadgeTier, LedgerReason};
use leadrs::domain::models::notification::NotificationKind;
use leadrs::domain::models::reward::AccrualReason;
use leadrs::domain::services::reward_service::{PayoutOutcome, RewardError};
use uuid::Uuid;

use super::helpers::{create_test_app, outbox_for, seed_account};

/// 积分按角色路由：业主得奖励积分，技工得排行榜得分
#[tokio::test]
async fn test_accrue_routes_by_role() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 0, 0).await;

    app.reward_service
        .accrue(homeowner.id, AccrualReason::EmergencyJobPosted)
        .await
        .unwrap();
    app.reward_service
        .accrue(tradie.id, AccrualReason::JobCompleted)
        .await
        .unwrap();

    let homeowner = app.ledger_service.account(homeowner.id).await.unwrap();
    assert_eq!(homeowner.reward_points, 25);
    assert_eq!(homeowner.score, 0);

    let tradie = app.ledger_service.account(tradie.id).await.unwrap();
    assert_eq!(tradie.reward_points, 0);
    assert_eq!(tradie.score, 15);
}

/// 兑换成功：扣积分、记录待处理兑换、通知状态变更
#[tokio::test]
async fn test_redeem_deducts_and_records() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 200).await;

    let record = app
        .reward_service
        .redeem(homeowner.id, "movie-ticket")
        .await
        .unwrap();
    assert_eq!(record.points_cost, 120);

    let account = app.ledger_service.account(homeowner.id).await.unwrap();
    assert_eq!(account.reward_points, 80);

    let redemptions = app
        .reward_service
        .redemptions(homeowner.id, None)
        .await
        .unwrap();
    assert_eq!(redemptions.len(), 1);

    let events = outbox_for(&app, homeowner.id).await;
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].event_type,
        NotificationKind::RedemptionStatusChanged
    );
}

#[tokio::test]
async fn test_redeem_unknown_reward() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 1000).await;

    let result = app.reward_service.redeem(homeowner.id, "free-yacht").await;
    assert!(matches!(result, Err(RewardError::UnknownReward(_))));
}

/// 积分不足的兑换不留下任何变更
#[tokio::test]
async fn test_redeem_insufficient_points() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 30).await;

    let result = app.reward_service.redeem(homeowner.id, "coffee-voucher").await;
    match result {
        Err(RewardError::InsufficientPoints {
            available,
            required,
        }) => {
            assert_eq!(available, 30);
            assert_eq!(required, 50);
        }
        other => panic!("expected InsufficientPoints, got {:?}", other.err()),
    }

    let account = app.ledger_service.account(homeowner.id).await.unwrap();
    assert_eq!(account.reward_points, 30);
    assert!(app
        .reward_service
        .redemptions(homeowner.id, None)
        .await
        .unwrap()
        .is_empty());
}

/// 并发兑换：积分只够一次时，两个并发请求恰好一个成功
#[tokio::test]
async fn test_concurrent_redemptions_cannot_over_redeem() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 60).await;

    let mut handles = Vec::new();
    for _ in 0..2 {
        let rewards = app.reward_service.clone();
        let account_id = homeowner.id;
        handles.push(tokio::spawn(async move {
            rewards.redeem(account_id, "coffee-voucher").await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);

    let account = app.ledger_service.account(homeowner.id).await.unwrap();
    assert_eq!(account.reward_points, 10);
}

/// 每周发放：前五名得信用点，前三名得徽章，其余清零；
/// 同周期重复运行是空操作
#[tokio::test]
async fn test_weekly_payout_is_idempotent_per_period() {
    let app = create_test_app().await;

    // 六名技工，完成工作数递减，得分 75/60/45/30/15/0
    let mut tradies = Vec::new();
    for completions in [5usize, 4, 3, 2, 1, 0] {
        let tradie = seed_account(&app, AccountRole::Tradie, 0, 0).await;
        for _ in 0..completions {
            app.reward_service
                .accrue(tradie.id, AccrualReason::JobCompleted)
                .await
                .unwrap();
        }
        tradies.push((tradie.id, completions));
    }

    let first = app.reward_service.weekly_payout("2026-W32").await.unwrap();
    assert_eq!(first, PayoutOutcome::Paid { winners: 5 });

    let second = app.reward_service.weekly_payout("2026-W32").await.unwrap();
    assert_eq!(second, PayoutOutcome::AlreadyCompleted);

    // 信用点只发一次：名次奖励 25/20/15/10/5
    let expected_credits = [25i64, 20, 15, 10, 5, 0];
    let expected_badges = [
        Some(BadgeTier::Gold),
        Some(BadgeTier::Silver),
        Some(BadgeTier::Bronze),
        None,
        None,
        None,
    ];

    let mut badge_holders = 0;
    for (index, (tradie_id, _)) in tradies.iter().enumerate() {
        let account = app.ledger_service.account(*tradie_id).await.unwrap();
        assert_eq!(
            account.credits, expected_credits[index],
            "rank {} credits",
            index
        );
        assert_eq!(account.badge, expected_badges[index], "rank {} badge", index);
        if account.badge.is_some() {
            badge_holders += 1;
        }
    }
    assert_eq!(badge_holders, 3);

    // 前五名之外的得分被清零
    let last = app.ledger_service.account(tradies[5].0).await.unwrap();
    assert_eq!(last.score, 0);
}

/// 决胜规则：得分相同，创建时间早者胜
#[tokio::test]
async fn test_payout_tie_break_by_creation_time() {
    let app = create_test_app().await;

    let older = seed_account(&app, AccountRole::Tradie, 0, 0).await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let newer = seed_account(&app, AccountRole::Tradie, 0, 0).await;

    for id in [older.id, newer.id] {
        app.reward_service
            .accrue(id, AccrualReason::JobCompleted)
            .await
            .unwrap();
    }

    app.reward_service.weekly_payout("2026-W33").await.unwrap();

    let older = app.ledger_service.account(older.id).await.unwrap();
    let newer = app.ledger_service.account(newer.id).await.unwrap();
    assert_eq!(older.badge, Some(BadgeTier::Gold));
    assert_eq!(older.credits, 25);
    assert_eq!(newer.badge, Some(BadgeTier::Silver));
    assert_eq!(newer.credits, 20);
}

/// 不足五名技工时跳过缺失的名次
#[tokio::test]
async fn test_payout_with_fewer_than_five_tradies() {
    let app = create_test_app().await;

    let only = seed_account(&app, AccountRole::Tradie, 0, 0).await;
    app.reward_service
        .accrue(only.id, AccrualReason::JobCompleted)
        .await
        .unwrap();

    let outcome = app.reward_service.weekly_payout("2026-W34").await.unwrap();
    assert_eq!(outcome, PayoutOutcome::Paid { winners: 1 });

    let account = app.ledger_service.account(only.id).await.unwrap();
    assert_eq!(account.credits, 25);
    assert_eq!(account.badge, Some(BadgeTier::Gold));
}

/// 上周徽章持有者跌出前三后徽章被清除
#[tokio::test]
async fn test_payout_clears_stale_badges() {
    let app = create_test_app().await;

    let faded = seed_account(&app, AccountRole::Tradie, 0, 0).await;
    app.reward_service
        .accrue(faded.id, AccrualReason::JobCompleted)
        .await
        .unwrap();
    app.reward_service.weekly_payout("2026-W35").await.unwrap();

    let account = app.ledger_service.account(faded.id).await.unwrap();
    assert_eq!(account.badge, Some(BadgeTier::Gold));

    // 下一周期：四名新技工得分更高，faded 跌出前三
    for _ in 0..4 {
        let rival = seed_account(&app, AccountRole::Tradie, 0, 0).await;
        for _ in 0..3 {
            app.reward_service
                .accrue(rival.id, AccrualReason::JobCompleted)
                .await
                .unwrap();
        }
    }

    app.reward_service.weekly_payout("2026-W36").await.unwrap();

    let account = app.ledger_service.account(faded.id).await.unwrap();
    assert_eq!(account.badge, None);
}

/// 评价提交：评价方得积分，被评价技工收到通知
#[tokio::test]
async fn test_review_submitted_accrues_and_notifies() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 0, 0).await;

    app.reward_service
        .review_submitted(homeowner.id, tradie.id, Uuid::new_v4(), 5)
        .await
        .unwrap();

    let homeowner = app.ledger_service.account(homeowner.id).await.unwrap();
    assert_eq!(homeowner.reward_points, 10);

    let events = outbox_for(&app, tradie.id).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, NotificationKind::ReviewReceived);
}

/// 工作完成入口：状态推进 + 双方累积在同一事务内
#[tokio::test]
async fn test_job_completion_accrues_both_tracks() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 20, 0).await;
    let job = super::helpers::seed_job(&app, homeowner.id, false).await;

    app.lead_service
        .purchase_lead(job.id, tradie.id)
        .await
        .unwrap();
    app.job_service
        .complete_job(job.id, homeowner.id)
        .await
        .unwrap();

    let homeowner = app.ledger_service.account(homeowner.id).await.unwrap();
    assert_eq!(homeowner.reward_points, 15);

    let tradie = app.ledger_service.account(tradie.id).await.unwrap();
    assert_eq!(tradie.score, 15);

    // 完成过的工作不能再次完成
    let again = app.job_service.complete_job(job.id, homeowner.id).await;
    assert!(again.is_err());
}

/// 每周发放的账本条目带 weekly_payout 原因
#[tokio::test]
async fn test_payout_writes_audited_ledger_entries() {
    let app = create_test_app().await;
    let tradie = seed_account(&app, AccountRole::Tradie, 0, 0).await;
    app.reward_service
        .accrue(tradie.id, AccrualReason::JobCompleted)
        .await
        .unwrap();

    app.reward_service.weekly_payout("2026-W37").await.unwrap();

    let history = app.ledger_service.history(tradie.id, None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reason, LedgerReason::WeeklyPayout);
    assert_eq!(history[0].delta, 25);
}
