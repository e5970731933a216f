// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::models::account::{AccountRole, BadgeTier, LedgerReason};
use crate::domain::models::notification::NotificationKind;
use crate::domain::models::reward::{
    AccrualReason, RedemptionRecord, RedemptionStatus, RewardCatalog, PAYOUT_CREDITS,
};
use crate::domain::repositories::account_repository::{AccountRepository, AccountRepositoryError};
use crate::domain::repositories::reward_repository::{RewardRepository, RewardRepositoryError};
use crate::domain::services::notification_service::NotificationService;

/// 奖励服务错误类型
#[derive(Error, Debug)]
pub enum RewardError {
    /// 账户未找到
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),
    /// 未知的目录奖励
    #[error("Unknown reward: {0}")]
    UnknownReward(String),
    /// 积分不足
    #[error("Insufficient points: available {available}, required {required}")]
    InsufficientPoints { available: i64, required: i64 },
    /// 存储错误
    #[error("Store error: {0}")]
    Store(#[from] DbErr),
}

impl From<AccountRepositoryError> for RewardError {
    fn from(err: AccountRepositoryError) -> Self {
        match err {
            AccountRepositoryError::Database(e) => RewardError::Store(e),
            AccountRepositoryError::AccountNotFound(id) => RewardError::AccountNotFound(id),
            AccountRepositoryError::InsufficientCredits {
                available,
                required,
            }
            | AccountRepositoryError::InsufficientPoints {
                available,
                required,
            } => RewardError::InsufficientPoints {
                available,
                required,
            },
            AccountRepositoryError::InvalidAmount(_) => {
                RewardError::Store(DbErr::Custom("invalid points amount".into()))
            }
        }
    }
}

impl From<RewardRepositoryError> for RewardError {
    fn from(err: RewardRepositoryError) -> Self {
        match err {
            RewardRepositoryError::Database(e) => RewardError::Store(e),
        }
    }
}

/// 每周发放结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutOutcome {
    /// 该周期已发放过，本次调用为空操作
    AlreadyCompleted,
    /// 本次发放完成，附获奖账户数
    Paid { winners: usize },
}

/// 奖励/积分服务
///
/// 按固定的原因→积分表累积，原子兑换，以及每周排行榜发放。
/// 积分路由按角色区分：业主累积可兑换的奖励积分，技工累积
/// 滚动排行榜得分。
pub struct RewardService {
    db: Arc<DatabaseConnection>,
    accounts: Arc<dyn AccountRepository>,
    rewards: Arc<dyn RewardRepository>,
    notifier: Arc<dyn NotificationService>,
}

impl RewardService {
    /// 创建新的奖励服务实例
    pub fn new(
        db: Arc<DatabaseConnection>,
        accounts: Arc<dyn AccountRepository>,
        rewards: Arc<dyn RewardRepository>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            db,
            accounts,
            rewards,
            notifier,
        }
    }

    /// 累积积分
    ///
    /// 业主账户增加奖励积分，技工账户增加排行榜得分，
    /// 数值来自固定的原因表。
    pub async fn accrue(&self, account_id: Uuid, reason: AccrualReason) -> Result<(), RewardError> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(RewardError::AccountNotFound(account_id))?;

        let points = reason.points();
        let txn = self.db.begin().await?;

        match account.role {
            AccountRole::HomeownerResident => {
                self.accounts
                    .credit_points(&txn, account_id, points)
                    .await?;
            }
            AccountRole::Tradie => {
                self.accounts.add_score(&txn, account_id, points).await?;
            }
        }

        txn.commit().await?;

        counter!("reward_accruals_total", "reason" => reason.to_string()).increment(1);
        info!(
            "Accrued {} points to account {} for {}",
            points, account_id, reason
        );
        Ok(())
    }

    /// 评价提交
    ///
    /// 评价正文的存储与聚合在核心之外；这里为评价方累积积分，
    /// 并通知被评价的技工。两者在同一事务内提交。
    pub async fn review_submitted(
        &self,
        reviewer_id: Uuid,
        tradie_id: Uuid,
        job_id: Uuid,
        rating: u8,
    ) -> Result<(), RewardError> {
        let txn = self.db.begin().await?;

        self.accounts
            .credit_points(&txn, reviewer_id, AccrualReason::ReviewLeft.points())
            .await?;

        self.notifier
            .notify(
                &txn,
                tradie_id,
                NotificationKind::ReviewReceived,
                json!({
                    "job_id": job_id,
                    "reviewer_id": reviewer_id,
                    "rating": rating,
                }),
            )
            .await;

        txn.commit().await?;

        counter!("reward_accruals_total", "reason" => AccrualReason::ReviewLeft.to_string())
            .increment(1);
        info!(
            "Review on job {} recorded: {} points to reviewer {}",
            job_id,
            AccrualReason::ReviewLeft.points(),
            reviewer_id
        );
        Ok(())
    }

    /// 兑换奖励
    ///
    /// 原子条件扣减积分并写入待处理兑换记录；同一账户的并发
    /// 兑换不可能同时超出积分余额。
    pub async fn redeem(
        &self,
        account_id: Uuid,
        reward_id: &str,
    ) -> Result<RedemptionRecord, RewardError> {
        let item = RewardCatalog::find(reward_id)
            .ok_or_else(|| RewardError::UnknownReward(reward_id.to_string()))?;

        let txn = self.db.begin().await?;

        self.accounts
            .debit_points(&txn, account_id, item.points_cost)
            .await?;

        let record = RedemptionRecord {
            id: Uuid::new_v4(),
            account_id,
            reward_id: item.id.to_string(),
            points_cost: item.points_cost,
            status: RedemptionStatus::Pending,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };
        self.rewards.insert_redemption(&txn, &record).await?;

        self.notifier
            .notify(
                &txn,
                account_id,
                NotificationKind::RedemptionStatusChanged,
                json!({
                    "redemption_id": record.id,
                    "reward_id": record.reward_id,
                    "status": record.status,
                }),
            )
            .await;

        txn.commit().await?;

        counter!("reward_redemptions_total").increment(1);
        info!(
            "Account {} redeemed {} for {} points",
            account_id, reward_id, item.points_cost
        );
        Ok(record)
    }

    /// 兑换历史
    pub async fn redemptions(
        &self,
        account_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<RedemptionRecord>, RewardError> {
        Ok(self.rewards.list_redemptions(account_id, limit).await?)
    }

    /// 当前排行榜（得分降序，创建时间升序决胜）
    pub async fn leaderboard(
        &self,
        limit: u64,
    ) -> Result<Vec<crate::domain::models::account::Account>, RewardError> {
        let txn = self.db.begin().await?;
        let ranked = self.accounts.rank_tradies(&txn, limit).await?;
        txn.commit().await?;
        Ok(ranked)
    }

    /// 每周排行榜发放
    ///
    /// 幂等且全局单飞：周期的唯一约束保证同一周期的第二次
    /// 调用是空操作。前五名获得信用点（25/20/15/10/5），前三名
    /// 获得徽章（金/银/铜）；前五名之外的所有技工得分清零，
    /// 前三名之外的所有账户徽章清除。
    pub async fn weekly_payout(&self, period: &str) -> Result<PayoutOutcome, RewardError> {
        let txn = self.db.begin().await?;

        if !self.rewards.begin_payout_run(&txn, period).await? {
            txn.rollback().await?;
            warn!("Weekly payout for period {} already completed", period);
            return Ok(PayoutOutcome::AlreadyCompleted);
        }

        let ranked = self.accounts.rank_tradies(&txn, 5).await?;

        let mut winner_ids = Vec::with_capacity(ranked.len());
        for (rank, account) in ranked.iter().enumerate() {
            self.accounts
                .credit_credits(
                    &txn,
                    account.id,
                    PAYOUT_CREDITS[rank],
                    LedgerReason::WeeklyPayout,
                    None,
                )
                .await?;

            let badge = match rank {
                0 => Some(BadgeTier::Gold),
                1 => Some(BadgeTier::Silver),
                2 => Some(BadgeTier::Bronze),
                _ => None,
            };
            self.accounts.set_badge(&txn, account.id, badge).await?;
            winner_ids.push(account.id);
        }

        let badge_holders: Vec<Uuid> = winner_ids.iter().take(3).copied().collect();
        self.accounts
            .clear_badges_except(&txn, &badge_holders)
            .await?;
        self.accounts
            .reset_scores_except(&txn, &winner_ids)
            .await?;

        self.rewards.complete_payout_run(&txn, period).await?;
        txn.commit().await?;

        counter!("weekly_payouts_total").increment(1);
        info!(
            "Weekly payout for period {} completed: {} winners",
            period,
            winner_ids.len()
        );
        Ok(PayoutOutcome::Paid {
            winners: winner_ids.len(),
        })
    }
}

/// 某时刻所属的发放周期（ISO 周编号）
pub fn payout_period(at: DateTime<Utc>) -> String {
    at.format("%G-W%V").to_string()
}
