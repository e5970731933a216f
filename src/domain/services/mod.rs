// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含系统的核心业务逻辑服务，这些服务封装了复杂的
/// 业务规则和领域逻辑，协调多个领域对象来完成业务操作。
///
/// 包含的服务：
/// - 工作服务（job_service）：工作发布与完成入口及其累积
/// - 账本服务（ledger_service）：信用点余额的原子变更与审计
/// - 潜在客户服务（lead_service）：购买请求的单事务复合操作
/// - 会话服务（conversation_service）：幂等创建、消息追加与回复门控
/// - 奖励服务（reward_service）：积分累积、兑换与每周发放
/// - 通知服务（notification_service）：带外推送的分发接口
/// - 内容审查（moderation）：入口文本的防御性复查
///
/// 所有跨实体的复合操作都在单个事务内完成，部分生效
/// 被视为缺陷而不是可接受的结果。
pub mod conversation_service;
pub mod job_service;
pub mod ledger_service;
pub mod lead_service;
pub mod moderation;
pub mod notification_service;
pub mod reward_service;
