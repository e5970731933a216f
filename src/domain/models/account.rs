// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 账户实体
///
/// 持有信用点余额与奖励积分余额的交易方。业主发布工作并积累
/// 奖励积分；技工购买潜在客户并参与每周排行榜。余额只能通过
/// 账本操作变更，任何会导致负余额的变更都会被原子性拒绝。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// 账户唯一标识符
    pub id: Uuid,
    /// 账户角色
    pub role: AccountRole,
    /// 显示名称
    pub display_name: String,
    /// 信用点余额，永不为负
    pub credits: i64,
    /// 奖励积分余额，永不为负
    pub reward_points: i64,
    /// 滚动排行榜得分（技工）
    pub score: i64,
    /// 每周徽章（前三名技工）
    pub badge: Option<BadgeTier>,
    /// 是否活跃（仅软停用，账户不会被删除）
    pub active: bool,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 更新时间
    pub updated_at: DateTime<FixedOffset>,
}

/// 账户角色枚举
///
/// 历史数据中同一概念存在 "homeowner" 与 "centraResident" 两种写法，
/// 解析时统一归一化为 HomeownerResident。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// 业主（Centra 住户），发布工作
    HomeownerResident,
    /// 技工，购买潜在客户
    Tradie,
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AccountRole::HomeownerResident => write!(f, "homeowner_resident"),
            AccountRole::Tradie => write!(f, "tradie"),
        }
    }
}

impl FromStr for AccountRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "homeowner_resident" | "homeowner" | "centra_resident" | "centraResident" => {
                Ok(AccountRole::HomeownerResident)
            }
            "tradie" => Ok(AccountRole::Tradie),
            _ => Err(()),
        }
    }
}

/// 每周徽章等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTier {
    /// 金牌，每周第一名
    Gold,
    /// 银牌，每周第二名
    Silver,
    /// 铜牌，每周第三名
    Bronze,
}

impl fmt::Display for BadgeTier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BadgeTier::Gold => write!(f, "gold"),
            BadgeTier::Silver => write!(f, "silver"),
            BadgeTier::Bronze => write!(f, "bronze"),
        }
    }
}

impl FromStr for BadgeTier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gold" => Ok(BadgeTier::Gold),
            "silver" => Ok(BadgeTier::Silver),
            "bronze" => Ok(BadgeTier::Bronze),
            _ => Err(()),
        }
    }
}

/// 账本条目
///
/// 余额变更的只追加审计记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// 条目唯一标识符
    pub id: Uuid,
    /// 所属账户ID
    pub account_id: Uuid,
    /// 余额变化量，扣减为负
    pub delta: i64,
    /// 变更后余额
    pub balance_after: i64,
    /// 变更原因
    pub reason: LedgerReason,
    /// 关联引用（工作ID、支付确认号等）
    pub reference_id: Option<Uuid>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

/// 账本变更原因枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    /// 购买潜在客户
    LeadPurchase,
    /// 充值（支付处理器确认后入账）
    TopUp,
    /// 每周排行榜发放
    WeeklyPayout,
    /// 人工调整
    ManualAdjustment,
}

impl fmt::Display for LedgerReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LedgerReason::LeadPurchase => write!(f, "lead_purchase"),
            LedgerReason::TopUp => write!(f, "top_up"),
            LedgerReason::WeeklyPayout => write!(f, "weekly_payout"),
            LedgerReason::ManualAdjustment => write!(f, "manual_adjustment"),
        }
    }
}

impl FromStr for LedgerReason {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lead_purchase" => Ok(LedgerReason::LeadPurchase),
            "top_up" => Ok(LedgerReason::TopUp),
            "weekly_payout" => Ok(LedgerReason::WeeklyPayout),
            "manual_adjustment" => Ok(LedgerReason::ManualAdjustment),
            _ => Err(()),
        }
    }
}
