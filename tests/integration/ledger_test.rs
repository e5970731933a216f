// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use leadrs::domain::models::account::{AccountRole, LedgerReason};
use leadrs::domain::services::ledger_service::LedgerError;
use uuid::Uuid;

use super::helpers::{create_test_app, seed_account};

/// 扣减成功路径：余额下降并留下审计条目
#[tokio::test]
async fn test_debit_decrements_and_records_entry() {
    let app = create_test_app().await;
    let tradie = seed_account(&app, AccountRole::Tradie, 20, 0).await;

    let new_balance = app
        .ledger_service
        .debit(tradie.id, 5, LedgerReason::LeadPurchase, None)
        .await
        .unwrap();
    assert_eq!(new_balance, 15);

    let history = app.ledger_service.history(tradie.id, None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].delta, -5);
    assert_eq!(history[0].balance_after, 15);
}

/// 余额不足：拒绝且无任何变更
#[tokio::test]
async fn test_debit_insufficient_credits_leaves_no_trace() {
    let app = create_test_app().await;
    let tradie = seed_account(&app, AccountRole::Tradie, 3, 0).await;

    let result = app
        .ledger_service
        .debit(tradie.id, 10, LedgerReason::LeadPurchase, None)
        .await;

    match result {
        Err(LedgerError::InsufficientCredits {
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
    let history = app.ledger_service.history(tradie.id, None).await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_debit_unknown_account() {
    let app = create_test_app().await;

    let result = app
        .ledger_service
        .debit(Uuid::new_v4(), 1, LedgerReason::ManualAdjustment, None)
        .await;
    assert!(matches!(result, Err(LedgerError::AccountNotFound(_))));
}

#[tokio::test]
async fn test_invalid_amount_rejected_before_mutation() {
    let app = create_test_app().await;
    let tradie = seed_account(&app, AccountRole::Tradie, 10, 0).await;

    let result = app
        .ledger_service
        .debit(tradie.id, 0, LedgerReason::ManualAdjustment, None)
        .await;
    assert!(matches!(result, Err(LedgerError::InvalidAmount(0))));

    let result = app
        .ledger_service
        .credit(tradie.id, -5, LedgerReason::ManualAdjustment, None)
        .await;
    assert!(matches!(result, Err(LedgerError::InvalidAmount(-5))));
}

/// 并发扣减：余额在任何交错下都不会变成负数
#[tokio::test]
async fn test_concurrent_debits_never_go_negative() {
    let app = create_test_app().await;
    let tradie = seed_account(&app, AccountRole::Tradie, 10, 0).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let ledger = app.ledger_service.clone();
        let account_id = tradie.id;
        handles.push(tokio::spawn(async move {
            ledger
                .debit(account_id, 4, LedgerReason::LeadPurchase, None)
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    // 10 个信用点最多承受两次 4 点扣减
    assert_eq!(successes, 2);
    let account = app.ledger_service.account(tradie.id).await.unwrap();
    assert_eq!(account.credits, 2);
    assert!(account.credits >= 0);
}

/// 支付确认的至少一次送达：同一确认号只入账一次
#[tokio::test]
async fn test_top_up_is_idempotent_by_payment_ref() {
    let app = create_test_app().await;
    let homeowner = seed_account(&app, AccountRole::HomeownerResident, 0, 0).await;
    let payment_ref = Uuid::new_v4();

    let first = app
        .ledger_service
        .confirm_top_up(homeowner.id, 50, payment_ref)
        .await
        .unwrap();
    assert_eq!(first, 50);

    let second = app
        .ledger_service
        .confirm_top_up(homeowner.id, 50, payment_ref)
        .await
        .unwrap();
    assert_eq!(second, 50);

    let account = app.ledger_service.account(homeowner.id).await.unwrap();
    assert_eq!(account.credits, 50);

    let history = app
        .ledger_service
        .history(homeowner.id, None)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}
