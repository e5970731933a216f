// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 每周排行榜前五名的信用点奖励，按名次降序
pub const PAYOUT_CREDITS: [i64; 5] = [25, 20, 15, 10, 5];

/// 积分累积原因枚举
///
/// 每个原因对应固定的积分值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualReason {
    /// 工作完成
    JobCompleted,
    /// 留下评价
    ReviewLeft,
    /// 发布紧急工作
    EmergencyJobPosted,
}

impl AccrualReason {
    /// 该原因累积的积分值
    pub fn points(&self) -> i64 {
        match self {
            AccrualReason::JobCompleted => 15,
            AccrualReason::ReviewLeft => 10,
            AccrualReason::EmergencyJobPosted => 25,
        }
    }
}

impl fmt::Display for AccrualReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AccrualReason::JobCompleted => write!(f, "job_completed"),
            AccrualReason::ReviewLeft => write!(f, "review_left"),
            AccrualReason::EmergencyJobPosted => write!(f, "emergency_job_posted"),
        }
    }
}

impl FromStr for AccrualReason {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job_completed" => Ok(AccrualReason::JobCompleted),
            "review_left" => Ok(AccrualReason::ReviewLeft),
            "emergency_job_posted" => Ok(AccrualReason::EmergencyJobPosted),
            _ => Err(()),
        }
    }
}

/// 兑换记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionRecord {
    /// 记录唯一标识符
    pub id: Uuid,
    /// 兑换账户ID
    pub account_id: Uuid,
    /// 目录奖励ID
    pub reward_id: String,
    /// 扣除的积分
    pub points_cost: i64,
    /// 兑换状态
    pub status: RedemptionStatus,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 更新时间
    pub updated_at: DateTime<FixedOffset>,
}

/// 兑换状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    /// 待处理，积分已扣除
    #[default]
    Pending,
    /// 已履行
    Fulfilled,
    /// 已取消
    Cancelled,
}

impl fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RedemptionStatus::Pending => write!(f, "pending"),
            RedemptionStatus::Fulfilled => write!(f, "fulfilled"),
            RedemptionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for RedemptionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RedemptionStatus::Pending),
            "fulfilled" => Ok(RedemptionStatus::Fulfilled),
            "cancelled" => Ok(RedemptionStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// 奖励目录条目
#[derive(Debug, Clone, Serialize)]
pub struct RewardItem {
    /// 目录ID
    pub id: &'static str,
    /// 名称
    pub name: &'static str,
    /// 兑换所需积分
    pub points_cost: i64,
}

/// 奖励目录
///
/// 目录的展示界面在核心之外；核心只需要积分价格来执行兑换。
pub struct RewardCatalog;

impl RewardCatalog {
    /// 所有可兑换的奖励
    pub fn items() -> &'static [RewardItem] {
        const ITEMS: [RewardItem; 4] = [
            RewardItem {
                id: "coffee-voucher",
                name: "Coffee voucher",
                points_cost: 50,
            },
            RewardItem {
                id: "movie-ticket",
                name: "Movie ticket",
                points_cost: 120,
            },
            RewardItem {
                id: "hardware-gift-card",
                name: "Hardware store gift card",
                points_cost: 300,
            },
            RewardItem {
                id: "home-clean",
                name: "Professional home clean",
                points_cost: 600,
            },
        ];
        &ITEMS
    }

    /// 按ID查找奖励
    pub fn find(reward_id: &str) -> Option<&'static RewardItem> {
        Self::items().iter().find(|item| item.id == reward_id)
    }
}
