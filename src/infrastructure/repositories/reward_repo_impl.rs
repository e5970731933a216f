// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::reward::{RedemptionRecord, RedemptionStatus};
use crate::domain::repositories::reward_repository::{RewardRepository, RewardRepositoryError};
use crate::infrastructure::database::entities::{payout_run, reward_redemption};

/// 奖励仓库实现
///
/// 发放运行以 payout_runs.period 的唯一约束做互斥：插入被
/// 冲突吞掉即该周期已发放，调用方据此空操作返回。
pub struct RewardRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl RewardRepositoryImpl {
    /// 创建新的奖励仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<reward_redemption::Model> for RedemptionRecord {
    fn from(model: reward_redemption::Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            reward_id: model.reward_id,
            points_cost: model.points_cost,
            status: RedemptionStatus::from_str(&model.status).unwrap_or_default(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[async_trait]
impl RewardRepository for RewardRepositoryImpl {
    async fn insert_redemption(
        &self,
        txn: &DatabaseTransaction,
        record: &RedemptionRecord,
    ) -> Result<(), RewardRepositoryError> {
        let model = reward_redemption::ActiveModel {
            id: Set(record.id),
            account_id: Set(record.account_id),
            reward_id: Set(record.reward_id.clone()),
            points_cost: Set(record.points_cost),
            status: Set(record.status.to_string()),
            created_at: Set(record.created_at),
            updated_at: Set(record.updated_at),
        };
        model.insert(txn).await?;
        Ok(())
    }

    async fn list_redemptions(
        &self,
        account_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<RedemptionRecord>, RewardRepositoryError> {
        let mut query = reward_redemption::Entity::find()
            .filter(reward_redemption::Column::AccountId.eq(account_id))
            .order_by_desc(reward_redemption::Column::CreatedAt);

        if let Some(limit) = limit {
            query = query.limit(limit as u64);
        }

        let models = query.all(self.db.as_ref()).await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn begin_payout_run(
        &self,
        txn: &DatabaseTransaction,
        period: &str,
    ) -> Result<bool, RewardRepositoryError> {
        let model = payout_run::ActiveModel {
            id: Set(Uuid::new_v4()),
            period: Set(period.to_string()),
            started_at: Set(Utc::now().fixed_offset()),
            completed_at: Set(None),
        };

        let rows_affected = payout_run::Entity::insert(model)
            .on_conflict(
                OnConflict::column(payout_run::Column::Period)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(txn)
            .await?;

        Ok(rows_affected > 0)
    }

    async fn complete_payout_run(
        &self,
        txn: &DatabaseTransaction,
        period: &str,
    ) -> Result<(), RewardRepositoryError> {
        payout_run::Entity::update_many()
            .col_expr(
                payout_run::Column::CompletedAt,
                Expr::value(Some(Utc::now().fixed_offset())),
            )
            .filter(payout_run::Column::Period.eq(period))
            .exec(txn)
            .await?;
        Ok(())
    }
}
