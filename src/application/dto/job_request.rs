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

/// 创建工作请求数据传输对象
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateJobRequestDto {
    /// 工作标题
    #[validate(length(min = 1, max = 120, message = "title must be 1-120 characters"))]
    pub title: String,
    /// 工作描述
    #[validate(length(min = 1, max = 4000, message = "description must be 1-4000 characters"))]
    pub description: String,
    /// 是否为紧急工作
    #[serde(default)]
    pub is_emergency: bool,
}

/// 工作响应数据传输对象
#[derive(Debug, Serialize)]
pub struct JobResponseDto {
    pub success: bool,
    pub id: Uuid,
    pub status: String,
    pub is_emergency: bool,
    pub lead_cost: i64,
}
