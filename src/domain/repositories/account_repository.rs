// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, DbErr};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::account::{Account, BadgeTier, LedgerEntry, LedgerReason};

#[derive(Error, Debug)]
pub enum AccountRepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 账户未找到
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),
    /// 信用点不足
    #[error("Insufficient credits: available {available}, required {required}")]
    InsufficientCredits { available: i64, required: i64 },
    /// 积分不足
    #[error("Insufficient points: available {available}, required {required}")]
    InsufficientPoints { available: i64, required: i64 },
    /// 无效金额（必须为正数）
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),
}

/// 账户仓库特质
///
/// 所有余额变更都是原子的条件更新：扣减在存储层验证
/// `balance >= amount`，零行受影响即失败，余额在任何时刻
/// 都不会被观察到负值。每次变更同时追加一条账本条目。
///
/// 变更方法接收一个打开的事务，调用方（领域服务）决定
/// 事务边界，从而可以将扣减与其他实体的写入合并为
/// 一个不可分割的单元。
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// 创建账户
    async fn create(&self, account: &Account) -> Result<Account, AccountRepositoryError>;

    /// 根据ID查找账户
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AccountRepositoryError>;

    /// 原子扣减信用点并追加账本条目，返回新余额
    async fn debit_credits(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        amount: i64,
        reason: LedgerReason,
        reference_id: Option<Uuid>,
    ) -> Result<i64, AccountRepositoryError>;

    /// 原子增加信用点并追加账本条目，返回新余额
    async fn credit_credits(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        amount: i64,
        reason: LedgerReason,
        reference_id: Option<Uuid>,
    ) -> Result<i64, AccountRepositoryError>;

    /// 原子增加奖励积分，返回新积分余额
    async fn credit_points(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        amount: i64,
    ) -> Result<i64, AccountRepositoryError>;

    /// 原子扣减奖励积分（兑换），返回新积分余额
    async fn debit_points(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        amount: i64,
    ) -> Result<i64, AccountRepositoryError>;

    /// 增加排行榜得分
    async fn add_score(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        delta: i64,
    ) -> Result<(), AccountRepositoryError>;

    /// 设置或清除徽章
    async fn set_badge(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        badge: Option<BadgeTier>,
    ) -> Result<(), AccountRepositoryError>;

    /// 按得分排名活跃技工（score 降序，创建时间升序决胜；零分不参与）
    async fn rank_tradies(
        &self,
        txn: &DatabaseTransaction,
        limit: u64,
    ) -> Result<Vec<Account>, AccountRepositoryError>;

    /// 将不在保留列表中的所有技工得分清零
    async fn reset_scores_except(
        &self,
        txn: &DatabaseTransaction,
        keep: &[Uuid],
    ) -> Result<u64, AccountRepositoryError>;

    /// 清除不在保留列表中的所有账户徽章
    async fn clear_badges_except(
        &self,
        txn: &DatabaseTransaction,
        keep: &[Uuid],
    ) -> Result<u64, AccountRepositoryError>;

    /// 获取账户的账本历史，按时间倒序
    async fn ledger_history(
        &self,
        account_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<LedgerEntry>, AccountRepositoryError>;

    /// 按引用查找账本条目（支付确认幂等检查）
    async fn find_ledger_entry_by_reference(
        &self,
        account_id: Uuid,
        reference_id: Uuid,
    ) -> Result<Option<LedgerEntry>, AccountRepositoryError>;
}
