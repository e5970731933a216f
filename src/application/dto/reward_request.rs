// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 兑换奖励请求数据传输对象
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RedeemRequestDto {
    /// 目录奖励ID
    #[validate(length(min = 1, message = "reward_id is required"))]
    pub reward_id: String,
}

/// 评价提交数据传输对象
///
/// 评价正文的存储与聚合在核心之外；核心只消费评价事件来
/// 累积积分并通知被评价方
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ReviewSubmittedDto {
    /// 被评价的工作
    pub job_id: Uuid,
    /// 被评价的技工
    pub tradie_id: Uuid,
    /// 评分（1-5）
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: u8,
}
