// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 会话实体
///
/// 业主与技工围绕一个工作的沟通通道。每个 (job_id, tradie_id)
/// 组合至多存在一个会话，由存储层唯一约束保证；重复请求返回
/// 已存在的会话而不是创建副本。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// 会话唯一标识符
    pub id: Uuid,
    /// 关联的工作ID
    pub job_id: Uuid,
    /// 业主账户ID
    pub homeowner_id: Uuid,
    /// 技工账户ID（解锁方）
    pub tradie_id: Uuid,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

impl Conversation {
    /// 判断账户是否为会话参与者
    pub fn is_participant(&self, account_id: Uuid) -> bool {
        self.homeowner_id == account_id || self.tradie_id == account_id
    }

    /// 给定一方，返回会话中的另一方
    pub fn counterpart_of(&self, account_id: Uuid) -> Option<Uuid> {
        if account_id == self.homeowner_id {
            Some(self.tradie_id)
        } else if account_id == self.tradie_id {
            Some(self.homeowner_id)
        } else {
            None
        }
    }
}

/// 消息实体
///
/// 一经创建不可变更；会话内的全序由存储分配的 `seq` 定义，
/// 而不是客户端提交顺序。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// 消息唯一标识符
    pub id: Uuid,
    /// 所属会话ID
    pub conversation_id: Uuid,
    /// 发送者账户ID
    pub sender_id: Uuid,
    /// 文本内容
    pub body: Option<String>,
    /// 附件URL（外部对象存储，内容不透明）
    pub attachment_url: Option<String>,
    /// 会话内序号，单调递增
    pub seq: i64,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

/// 会话门控状态
///
/// 由消息序列计算得出，不单独存储。只要消息全部来自解锁方
/// （技工），会话保持 AwaitingReply；一旦业主发出第一条消息，
/// 状态永久变为 Open —— 单向转换，永不回退。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// 等待业主回复，技工尚未获得完整沟通权限
    AwaitingReply,
    /// 业主已回复，会话完全开放
    Open,
}

impl GateState {
    /// 根据消息序列计算门控状态
    ///
    /// `homeowner_id` 为会话中技工的对端
    pub fn from_messages(homeowner_id: Uuid, messages: &[Message]) -> Self {
        if messages.iter().any(|m| m.sender_id == homeowner_id) {
            GateState::Open
        } else {
            GateState::AwaitingReply
        }
    }
}
