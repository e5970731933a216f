// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, DbErr};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::reward::RedemptionRecord;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RewardRepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// 奖励仓库特质
///
/// 管理兑换记录与每周发放运行。发放的幂等性建立在
/// payout_runs.period 的唯一约束之上：插入失败即表示
/// 该周期已经发放过。
#[async_trait]
pub trait RewardRepository: Send + Sync {
    /// 插入兑换记录
    async fn insert_redemption(
        &self,
        txn: &DatabaseTransaction,
        record: &RedemptionRecord,
    ) -> Result<(), RewardRepositoryError>;

    /// 某账户的兑换历史，按时间倒序
    async fn list_redemptions(
        &self,
        account_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<RedemptionRecord>, RewardRepositoryError>;

    /// 尝试开始一个周期的发放运行
    ///
    /// 返回 false 表示该周期已有发放记录（唯一约束冲突），
    /// 调用方必须将本次调用视为空操作。
    async fn begin_payout_run(
        &self,
        txn: &DatabaseTransaction,
        period: &str,
    ) -> Result<bool, RewardRepositoryError>;

    /// 标记周期发放完成
    async fn complete_payout_run(
        &self,
        txn: &DatabaseTransaction,
        period: &str,
    ) -> Result<(), RewardRepositoryError>;
}
