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

/// 支付确认回调数据传输对象
///
/// 由支付处理器在扣款成功后回调；payment_ref 是处理器侧的
/// 确认号，用于至少一次送达下的去重
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct PaymentConfirmationDto {
    /// 入账账户
    pub account_id: Uuid,
    /// 入账信用点数量
    #[validate(range(min = 1, message = "amount must be positive"))]
    pub amount: i64,
    /// 支付确认号
    pub payment_ref: Uuid,
}
