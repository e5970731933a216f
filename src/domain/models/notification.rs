// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 通知事件实体
///
/// 待推送给某个账户的带外通知，先写入发件箱表，由后台工作器
/// 投递到推送网关。投递失败不会回滚触发它的核心操作。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// 事件唯一标识符
    pub id: Uuid,
    /// 接收通知的账户ID
    pub account_id: Uuid,
    /// 事件类型，决定通知的内容和格式
    pub event_type: NotificationKind,
    /// 事件负载数据，包含具体的通知内容
    pub payload: serde_json::Value,
    /// 事件状态，跟踪事件的投递进度
    pub status: NotificationStatus,
    /// 已重试次数
    pub attempt_count: i32,
    /// 最大重试次数
    pub max_retries: i32,
    /// 响应状态码，最后一次投递的HTTP响应状态
    pub response_status: Option<i32>,
    /// 错误信息，投递失败时的错误描述
    pub error_message: Option<String>,
    /// 下次重试时间
    pub next_retry_at: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 投递时间，事件成功投递的时间戳
    pub delivered_at: Option<DateTime<Utc>>,
}

impl NotificationEvent {
    /// 创建一个新的待投递通知
    pub fn new(account_id: Uuid, event_type: NotificationKind, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            event_type,
            payload,
            status: NotificationStatus::Pending,
            attempt_count: 0,
            max_retries: 5,
            response_status: None,
            error_message: None,
            next_retry_at: None,
            created_at: Utc::now(),
            delivered_at: None,
        }
    }
}

/// 通知事件类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// 潜在客户已售出，通知业主
    LeadPurchased,
    /// 新消息，通知会话对端
    NewMessage,
    /// 收到评价，通知被评价的技工
    ReviewReceived,
    /// 兑换状态变更，通知兑换方
    RedemptionStatusChanged,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::LeadPurchased => write!(f, "lead_purchased"),
            NotificationKind::NewMessage => write!(f, "new_message"),
            NotificationKind::ReviewReceived => write!(f, "review_received"),
            NotificationKind::RedemptionStatusChanged => write!(f, "redemption_status_changed"),
        }
    }
}

impl FromStr for NotificationKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lead_purchased" => Ok(NotificationKind::LeadPurchased),
            "new_message" => Ok(NotificationKind::NewMessage),
            "review_received" => Ok(NotificationKind::ReviewReceived),
            "redemption_status_changed" => Ok(NotificationKind::RedemptionStatusChanged),
            _ => Err(()),
        }
    }
}

/// 通知状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    /// 待处理，事件已创建但尚未投递
    #[default]
    Pending,
    /// 已投递
    Delivered,
    /// 投递失败但仍在重试中
    Failed,
    /// 死信，已达到最大重试次数
    Dead,
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationStatus::Pending => write!(f, "pending"),
            NotificationStatus::Delivered => write!(f, "delivered"),
            NotificationStatus::Failed => write!(f, "failed"),
            NotificationStatus::Dead => write!(f, "dead"),
        }
    }
}

impl FromStr for NotificationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(NotificationStatus::Pending),
            "delivered" => Ok(NotificationStatus::Delivered),
            "failed" => Ok(NotificationStatus::Failed),
            "dead" => Ok(NotificationStatus::Dead),
            _ => Err(()),
        }
    }
}
