// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use leadrs::domain::models::account::{AccountRole, LedgerReason};
use leadrs::domain::models::job::JobStatus;
use leadrs::domain::models::notification::NotificationKind;
use leadrs::domain::services::lead_service::LeadError;
use uuid::Uuid;

use super::helpers::{create_test_app, outbox_for, seed_account, seed_job};

/// 标准购买：7 个信用点买 5 点的潜在客户，剩 2 点，
/// 工作分配给技工，会话已创建
#[tokio::test]
async fn test_purchase_lead_standard_flow() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 7, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;

    let conversation = app
        .lead_service
        .purchase_lead(job.id, tradie.id)
        .await
        .unwrap();

    assert_eq!(conversation.job_id, job.id);
    assert_eq!(conversation.homeowner_id, homeowner.id);
    assert_eq!(conversation.tradie_id, tradie.id);

    let account = app.ledger_service.account(tradie.id).await.unwrap();
    assert_eq!(account.credits, 2);

    let reloaded = app.job_service.find(job.id).await.unwrap();
    assert_eq!(reloaded.status, JobStatus::Assigned);
    assert_eq!(reloaded.assigned_tradie_id, Some(tradie.id));

    // 业主收到 lead_purchased 通知
    let events = outbox_for(&app, homeowner.id).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, NotificationKind::LeadPurchased);
}

/// 重复购买：同一技工的第二次购买也必须失败，且不再扣费
#[tokio::test]
async fn test_second_purchase_fails_with_already_assigned() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 20, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;

    app.lead_service
        .purchase_lead(job.id, tradie.id)
        .await
        .unwrap();

    let second = app.lead_service.purchase_lead(job.id, tradie.id).await;
    assert!(matches!(second, Err(LeadError::AlreadyAssigned)));

    let account = app.ledger_service.account(tradie.id).await.unwrap();
    assert_eq!(account.credits, 15);
}

/// 紧急工作价格为 10；余额 3 的技工购买失败且无任何变更
#[tokio::test]
async fn test_emergency_purchase_insufficient_credits() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let tradie = seed_account(&app, AccountRole::Tradie, 3, 0).await;
    let job = seed_job(&app, homeowner.id, true).await;

    let result = app.lead_service.purchase_lead(job.id, tradie.id).await;
    match result {
        Err(LeadError::InsufficientCredits {
            available,
            required,
        }) => {
            assert_eq!(available, 3);
            assert_eq!(required, 10);
        }
        other => panic!("expected InsufficientCredits, got {:?}", other.err()),
    }

    let account = app.ledger_service.account(tradie.id).await.unwrap();
    assert_eq!(account.credits, 3);

    let reloaded = app.job_service.find(job.id).await.unwrap();
    assert_eq!(reloaded.status, JobStatus::Open);
    assert_eq!(reloaded.assigned_tradie_id, None);

    // 失败的购买不留下会话
    let conversations = app
        .conversation_service
        .conversations_for(tradie.id)
        .await
        .unwrap();
    assert!(conversations.is_empty());
}

#[tokio::test]
async fn test_purchase_unknown_job() {
    let app = create_test_app().await;
    let tradie = seed_account(&app, AccountRole::Tradie, 20, 0).await;

    let result = app.lead_service.purchase_lead(Uuid::new_v4(), tradie.id).await;
    assert!(matches!(result, Err(LeadError::JobNotFound(_))));
}

/// 业主不能购买潜在客户
#[tokio::test]
async fn test_purchase_requires_tradie_role() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 100, 0).await;
    let other_homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let job = seed_job(&app, other_homeowner.id, false).await;

    let result = app.lead_service.purchase_lead(job.id, homeowner.id).await;
    assert!(matches!(result, Err(LeadError::RoleMismatch)));
}

/// 竞争：N 个余额充足的技工抢同一个工作，恰好一人成功，
/// 其余收到 AlreadyAssigned，账本里恰好一条该工作的扣费
#[tokio::test]
async fn test_concurrent_purchases_assign_exactly_once() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let job = seed_job(&app, homeowner.id, false).await;

    let mut tradie_ids = Vec::new();
    for _ in 0..6 {
        let tradie = seed_account(&app, AccountRole::Tradie, 50, 0).await;
        tradie_ids.push(tradie.id);
    }

    let mut handles = Vec::new();
    for tradie_id in &tradie_ids {
        let leads = app.lead_service.clone();
        let job_id = job.id;
        let tradie_id = *tradie_id;
        handles.push(tokio::spawn(async move {
            leads.purchase_lead(job_id, tradie_id).await
        }));
    }

    let mut winners = Vec::new();
    let mut losers = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(conversation) => winners.push(conversation),
            Err(LeadError::AlreadyAssigned) => losers += 1,
            Err(other) => panic!("unexpected purchase error: {}", other),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(losers, tradie_ids.len() - 1);

    let reloaded = app.job_service.find(job.id).await.unwrap();
    let winner_id = reloaded.assigned_tradie_id.unwrap();

    // 仅胜者被扣费
    for tradie_id in &tradie_ids {
        let account = app.ledger_service.account(*tradie_id).await.unwrap();
        if *tradie_id == winner_id {
            assert_eq!(account.credits, 45);
        } else {
            assert_eq!(account.credits, 50);
        }
    }

    // 该工作在账本中恰好出现一次
    let mut purchase_entries = 0;
    for tradie_id in &tradie_ids {
        let history = app.ledger_service.history(*tradie_id, None).await.unwrap();
        purchase_entries += history
            .iter()
            .filter(|entry| {
                entry.reason == LedgerReason::LeadPurchase && entry.reference_id == Some(job.id)
            })
            .count();
    }
    assert_eq!(purchase_entries, 1);
}
