// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::account::{Account, AccountRole, BadgeTier, LedgerEntry, LedgerReason};
use crate::domain::repositories::account_repository::{AccountRepository, AccountRepositoryError};
use crate::infrastructure::database::entities::{account, ledger_entry};

/// 账户仓库实现
///
/// 所有余额变更都以条件 UPDATE 落到存储层：扣减语句自带
/// `balance >= amount` 过滤，受影响行数为零即失败。余额检查
/// 与写入是同一条语句，不存在检查与写入之间的竞争窗口。
pub struct AccountRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl AccountRepositoryImpl {
    /// 创建新的账户仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 在事务内追加账本条目
    async fn append_ledger_entry(
        txn: &DatabaseTransaction,
        account_id: Uuid,
        delta: i64,
        balance_after: i64,
        reason: LedgerReason,
        reference_id: Option<Uuid>,
    ) -> Result<(), AccountRepositoryError> {
        let entry = ledger_entry::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(account_id),
            delta: Set(delta),
            balance_after: Set(balance_after),
            reason: Set(reason.to_string()),
            reference_id: Set(reference_id),
            created_at: Set(Utc::now().fixed_offset()),
        };
        entry.insert(txn).await?;
        Ok(())
    }

    /// 读取变更后的余额；条件更新已锁定该行，读取无竞争
    async fn current_credits(
        txn: &DatabaseTransaction,
        account_id: Uuid,
    ) -> Result<i64, AccountRepositoryError> {
        let model = account::Entity::find_by_id(account_id)
            .one(txn)
            .await?
            .ok_or(AccountRepositoryError::AccountNotFound(account_id))?;
        Ok(model.credits)
    }

    async fn current_points(
        txn: &DatabaseTransaction,
        account_id: Uuid,
    ) -> Result<i64, AccountRepositoryError> {
        let model = account::Entity::find_by_id(account_id)
            .one(txn)
            .await?
            .ok_or(AccountRepositoryError::AccountNotFound(account_id))?;
        Ok(model.reward_points)
    }
}

impl From<account::Model> for Account {
    fn from(model: account::Model) -> Self {
        Self {
            id: model.id,
            role: AccountRole::from_str(&model.role).unwrap_or(AccountRole::HomeownerResident),
            display_name: model.display_name,
            credits: model.credits,
            reward_points: model.reward_points,
            score: model.score,
            badge: model.badge.as_deref().and_then(|b| BadgeTier::from_str(b).ok()),
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<ledger_entry::Model> for LedgerEntry {
    fn from(model: ledger_entry::Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            delta: model.delta,
            balance_after: model.balance_after,
            reason: LedgerReason::from_str(&model.reason)
                .unwrap_or(LedgerReason::ManualAdjustment),
            reference_id: model.reference_id,
            created_at: model.created_at,
        }
    }
}

#[async_trait]
impl AccountRepository for AccountRepositoryImpl {
    async fn create(&self, a: &Account) -> Result<Account, AccountRepositoryError> {
        let model = account::ActiveModel {
            id: Set(a.id),
            role: Set(a.role.to_string()),
            display_name: Set(a.display_name.clone()),
            credits: Set(a.credits),
            reward_points: Set(a.reward_points),
            score: Set(a.score),
            badge: Set(a.badge.map(|b| b.to_string())),
            active: Set(a.active),
            created_at: Set(a.created_at),
            updated_at: Set(a.updated_at),
        };
        model.insert(self.db.as_ref()).await?;
        Ok(a.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AccountRepositoryError> {
        let model = account::Entity::find_by_id(id).one(self.db.as_ref()).await?;
        Ok(model.map(Into::into))
    }

    async fn debit_credits(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        amount: i64,
        reason: LedgerReason,
        reference_id: Option<Uuid>,
    ) -> Result<i64, AccountRepositoryError> {
        if amount <= 0 {
            return Err(AccountRepositoryError::InvalidAmount(amount));
        }

        let result = account::Entity::update_many()
            .col_expr(
                account::Column::Credits,
                Expr::col(account::Column::Credits).sub(amount),
            )
            .col_expr(
                account::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(account::Column::Id.eq(account_id))
            .filter(account::Column::Credits.gte(amount))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            // 区分账户缺失与余额不足
            let model = account::Entity::find_by_id(account_id).one(txn).await?;
            return match model {
                None => Err(AccountRepositoryError::AccountNotFound(account_id)),
                Some(m) => Err(AccountRepositoryError::InsufficientCredits {
                    available: m.credits,
                    required: amount,
                }),
            };
        }

        let balance_after = Self::current_credits(txn, account_id).await?;
        Self::append_ledger_entry(txn, account_id, -amount, balance_after, reason, reference_id)
            .await?;
        Ok(balance_after)
    }

    async fn credit_credits(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        amount: i64,
        reason: LedgerReason,
        reference_id: Option<Uuid>,
    ) -> Result<i64, AccountRepositoryError> {
        if amount <= 0 {
            return Err(AccountRepositoryError::InvalidAmount(amount));
        }

        let result = account::Entity::update_many()
            .col_expr(
                account::Column::Credits,
                Expr::col(account::Column::Credits).add(amount),
            )
            .col_expr(
                account::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(account::Column::Id.eq(account_id))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AccountRepositoryError::AccountNotFound(account_id));
        }

        let balance_after = Self::current_credits(txn, account_id).await?;
        Self::append_ledger_entry(txn, account_id, amount, balance_after, reason, reference_id)
            .await?;
        Ok(balance_after)
    }

    async fn credit_points(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        amount: i64,
    ) -> Result<i64, AccountRepositoryError> {
        if amount <= 0 {
            return Err(AccountRepositoryError::InvalidAmount(amount));
        }

        let result = account::Entity::update_many()
            .col_expr(
                account::Column::RewardPoints,
                Expr::col(account::Column::RewardPoints).add(amount),
            )
            .col_expr(
                account::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(account::Column::Id.eq(account_id))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AccountRepositoryError::AccountNotFound(account_id));
        }

        Self::current_points(txn, account_id).await
    }

    async fn debit_points(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        amount: i64,
    ) -> Result<i64, AccountRepositoryError> {
        if amount <= 0 {
            return Err(AccountRepositoryError::InvalidAmount(amount));
        }

        let result = account::Entity::update_many()
            .col_expr(
                account::Column::RewardPoints,
                Expr::col(account::Column::RewardPoints).sub(amount),
            )
            .col_expr(
                account::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(account::Column::Id.eq(account_id))
            .filter(account::Column::RewardPoints.gte(amount))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            let model = account::Entity::find_by_id(account_id).one(txn).await?;
            return match model {
                None => Err(AccountRepositoryError::AccountNotFound(account_id)),
                Some(m) => Err(AccountRepositoryError::InsufficientPoints {
                    available: m.reward_points,
                    required: amount,
                }),
            };
        }

        Self::current_points(txn, account_id).await
    }

    async fn add_score(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        delta: i64,
    ) -> Result<(), AccountRepositoryError> {
        let result = account::Entity::update_many()
            .col_expr(
                account::Column::Score,
                Expr::col(account::Column::Score).add(delta),
            )
            .col_expr(
                account::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(account::Column::Id.eq(account_id))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AccountRepositoryError::AccountNotFound(account_id));
        }
        Ok(())
    }

    async fn set_badge(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        badge: Option<BadgeTier>,
    ) -> Result<(), AccountRepositoryError> {
        let result = account::Entity::update_many()
            .col_expr(
                account::Column::Badge,
                Expr::value(badge.map(|b| b.to_string())),
            )
            .col_expr(
                account::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(account::Column::Id.eq(account_id))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AccountRepositoryError::AccountNotFound(account_id));
        }
        Ok(())
    }

    async fn rank_tradies(
        &self,
        txn: &DatabaseTransaction,
        limit: u64,
    ) -> Result<Vec<Account>, AccountRepositoryError> {
        let models = account::Entity::find()
            .filter(account::Column::Role.eq(AccountRole::Tradie.to_string()))
            .filter(account::Column::Active.eq(true))
            // 零分账户不参与排名，名次不足时直接跳过
            .filter(account::Column::Score.gt(0i64))
            .order_by_desc(account::Column::Score)
            // 决胜规则：创建时间早者优先，排名确定性的保证
            .order_by_asc(account::Column::CreatedAt)
            .limit(limit)
            .all(txn)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn reset_scores_except(
        &self,
        txn: &DatabaseTransaction,
        keep: &[Uuid],
    ) -> Result<u64, AccountRepositoryError> {
        let mut query = account::Entity::update_many()
            .col_expr(account::Column::Score, Expr::value(0i64))
            .col_expr(
                account::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(account::Column::Role.eq(AccountRole::Tradie.to_string()))
            .filter(account::Column::Score.ne(0i64));

        if !keep.is_empty() {
            query = query.filter(account::Column::Id.is_not_in(keep.to_vec()));
        }

        let result = query.exec(txn).await?;
        Ok(result.rows_affected)
    }

    async fn clear_badges_except(
        &self,
        txn: &DatabaseTransaction,
        keep: &[Uuid],
    ) -> Result<u64, AccountRepositoryError> {
        let mut query = account::Entity::update_many()
            .col_expr(account::Column::Badge, Expr::value(Option::<String>::None))
            .col_expr(
                account::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(account::Column::Badge.is_not_null());

        if !keep.is_empty() {
            query = query.filter(account::Column::Id.is_not_in(keep.to_vec()));
        }

        let result = query.exec(txn).await?;
        Ok(result.rows_affected)
    }

    async fn ledger_history(
        &self,
        account_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<LedgerEntry>, AccountRepositoryError> {
        let mut query = ledger_entry::Entity::find()
            .filter(ledger_entry::Column::AccountId.eq(account_id))
            .order_by_desc(ledger_entry::Column::CreatedAt);

        if let Some(limit) = limit {
            query = query.limit(limit as u64);
        }

        let entries = query.all(self.db.as_ref()).await?;
        Ok(entries.into_iter().map(Into::into).collect())
    }

    async fn find_ledger_entry_by_reference(
        &self,
        account_id: Uuid,
        reference_id: Uuid,
    ) -> Result<Option<LedgerEntry>, AccountRepositoryError> {
        let entry = ledger_entry::Entity::find()
            .filter(ledger_entry::Column::AccountId.eq(account_id))
            .filter(ledger_entry::Column::ReferenceId.eq(reference_id))
            .one(self.db.as_ref())
            .await?;
        Ok(entry.map(Into::into))
    }
}
