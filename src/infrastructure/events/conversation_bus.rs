// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::models::conversation::Message;

/// 每个会话通道的缓冲容量
const CHANNEL_CAPACITY: usize = 64;

/// 消息追加事件
///
/// 投递语义为至少一次：慢速订阅者在缓冲溢出后重新订阅时
/// 可能重复收到消息，订阅方必须按 message.id 去重。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAppended {
    /// 所属会话ID
    pub conversation_id: Uuid,
    /// 追加的消息
    pub message: Message,
}

/// 会话事件总线
///
/// 进程内发布/订阅：会话门控在消息提交后发布 MessageAppended，
/// 实时接口（SSE）按会话订阅。无订阅者时发布是空操作。
pub struct ConversationEventBus {
    channels: DashMap<Uuid, broadcast::Sender<MessageAppended>>,
}

impl ConversationEventBus {
    /// 创建新的事件总线实例
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// 发布消息追加事件
    pub fn publish(&self, event: MessageAppended) {
        if let Some(sender) = self.channels.get(&event.conversation_id) {
            // 返回值只反映当前订阅者数量，发布方不关心
            let _ = sender.send(event);
        }
    }

    /// 订阅某个会话的消息事件
    pub fn subscribe(&self, conversation_id: Uuid) -> broadcast::Receiver<MessageAppended> {
        self.channels
            .entry(conversation_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 回收没有订阅者的通道
    pub fn prune(&self) {
        self.channels.retain(|_, sender| sender.receiver_count() > 0);
    }
}

impl Default for ConversationEventBus {
    fn default() -> Self {
        Self::new()
    }
}
