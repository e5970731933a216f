// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 标准潜在客户价格（信用点）
pub const LEAD_COST_STANDARD: i64 = 5;
/// 紧急工作潜在客户价格（信用点）
pub const LEAD_COST_EMERGENCY: i64 = 10;

/// 工作实体
///
/// 业主发布的一个工作单元。`assigned_tradie_id` 至多被设置一次，
/// 且仅允许 Open → Assigned 的转换；之后的生命周期（进行中、
/// 完成、取消）由外部工作流推进。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// 工作唯一标识符
    pub id: Uuid,
    /// 发布者（业主）账户ID
    pub owner_id: Uuid,
    /// 工作标题
    pub title: String,
    /// 工作描述
    pub description: String,
    /// 是否为紧急工作（影响潜在客户价格）
    pub is_emergency: bool,
    /// 工作状态
    pub status: JobStatus,
    /// 已分配的技工账户ID，至多设置一次
    pub assigned_tradie_id: Option<Uuid>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 更新时间
    pub updated_at: DateTime<FixedOffset>,
}

/// 工作状态枚举
///
/// 状态转换遵循以下流程：
/// Open → Assigned → InProgress → Completed/Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 开放中，等待技工购买潜在客户
    #[default]
    Open,
    /// 已分配给某个技工
    Assigned,
    /// 进行中
    InProgress,
    /// 已完成
    Completed,
    /// 已取消
    Cancelled,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Open => write!(f, "open"),
            JobStatus::Assigned => write!(f, "assigned"),
            JobStatus::InProgress => write!(f, "in_progress"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(JobStatus::Open),
            "assigned" => Ok(JobStatus::Assigned),
            "in_progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            "cancelled" => Ok(JobStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition")]
    InvalidStateTransition,

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl Job {
    /// 创建一个新的开放工作
    pub fn new(owner_id: Uuid, title: String, description: String, is_emergency: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title,
            description,
            is_emergency,
            status: JobStatus::Open,
            assigned_tradie_id: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    /// 该工作的潜在客户价格
    pub fn lead_cost(&self) -> i64 {
        if self.is_emergency {
            LEAD_COST_EMERGENCY
        } else {
            LEAD_COST_STANDARD
        }
    }

    /// 分配给技工
    ///
    /// 仅允许 Open → Assigned；`assigned_tradie_id` 一经设置不可变更
    pub fn assign(mut self, tradie_id: Uuid) -> Result<Self, DomainError> {
        match (self.status, self.assigned_tradie_id) {
            (JobStatus::Open, None) => {
                self.status = JobStatus::Assigned;
                self.assigned_tradie_id = Some(tradie_id);
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 标记完成
    ///
    /// 由外部工作流在工作结束时调用
    pub fn complete(mut self) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Assigned | JobStatus::InProgress => {
                self.status = JobStatus::Completed;
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }
}
