// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::domain::models::account::{Account, LedgerEntry, LedgerReason};
use crate::domain::repositories::account_repository::{AccountRepository, AccountRepositoryError};

/// 账本服务错误类型
#[derive(Error, Debug)]
pub enum LedgerError {
    /// 账户未找到
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),
    /// 信用点不足
    #[error("Insufficient credits: available {available}, required {required}")]
    InsufficientCredits { available: i64, required: i64 },
    /// 积分不足
    #[error("Insufficient points: available {available}, required {required}")]
    InsufficientPoints { available: i64, required: i64 },
    /// 无效金额
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),
    /// 存储错误
    #[error("Store error: {0}")]
    Store(#[from] DbErr),
}

impl From<AccountRepositoryError> for LedgerError {
    fn from(err: AccountRepositoryError) -> Self {
        match err {
            AccountRepositoryError::Database(e) => LedgerError::Store(e),
            AccountRepositoryError::AccountNotFound(id) => LedgerError::AccountNotFound(id),
            AccountRepositoryError::InsufficientCredits {
                available,
                required,
            } => LedgerError::InsufficientCredits {
                available,
                required,
            },
            AccountRepositoryError::InsufficientPoints {
                available,
                required,
            } => LedgerError::InsufficientPoints {
                available,
                required,
            },
            AccountRepositoryError::InvalidAmount(n) => LedgerError::InvalidAmount(n),
        }
    }
}

/// 账本服务
///
/// 信用点余额变更的独立入口。每次变更在自己的事务里执行
/// 原子条件更新并追加审计条目；需要与其他实体写入合并的
/// 复合操作（购买潜在客户）直接在其自身事务上调用账户仓库。
pub struct LedgerService {
    db: Arc<DatabaseConnection>,
    accounts: Arc<dyn AccountRepository>,
}

impl LedgerService {
    /// 创建新的账本服务实例
    pub fn new(db: Arc<DatabaseConnection>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self { db, accounts }
    }

    /// 扣减信用点
    ///
    /// 余额不足时以 `InsufficientCredits` 失败，不产生任何变更
    pub async fn debit(
        &self,
        account_id: Uuid,
        amount: i64,
        reason: LedgerReason,
        reference_id: Option<Uuid>,
    ) -> Result<i64, LedgerError> {
        let txn = self.db.begin().await?;
        let new_balance = self
            .accounts
            .debit_credits(&txn, account_id, amount, reason, reference_id)
            .await?;
        txn.commit().await?;
        Ok(new_balance)
    }

    /// 增加信用点
    pub async fn credit(
        &self,
        account_id: Uuid,
        amount: i64,
        reason: LedgerReason,
        reference_id: Option<Uuid>,
    ) -> Result<i64, LedgerError> {
        let txn = self.db.begin().await?;
        let new_balance = self
            .accounts
            .credit_credits(&txn, account_id, amount, reason, reference_id)
            .await?;
        txn.commit().await?;
        Ok(new_balance)
    }

    /// 支付确认入账
    ///
    /// 支付处理器的确认回调至少送达一次；以 payment_ref 为引用
    /// 去重，重复确认是无变更的成功。
    pub async fn confirm_top_up(
        &self,
        account_id: Uuid,
        amount: i64,
        payment_ref: Uuid,
    ) -> Result<i64, LedgerError> {
        if let Some(existing) = self
            .accounts
            .find_ledger_entry_by_reference(account_id, payment_ref)
            .await?
        {
            info!(
                "Top-up {} for account {} already applied, skipping",
                payment_ref, account_id
            );
            return Ok(existing.balance_after);
        }

        let new_balance = self
            .credit(account_id, amount, LedgerReason::TopUp, Some(payment_ref))
            .await?;
        info!(
            "Top-up {} applied to account {}: +{} credits",
            payment_ref, account_id, amount
        );
        Ok(new_balance)
    }

    /// 查询账户
    pub async fn account(&self, account_id: Uuid) -> Result<Account, LedgerError> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    /// 账本历史
    pub async fn history(
        &self,
        account_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self.accounts.ledger_history(account_id, limit).await?)
    }
}
