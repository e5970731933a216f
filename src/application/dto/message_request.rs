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
use validator::Validate;

/// 发送消息请求数据传输对象
///
/// 正文与附件至少其一；两者是否同时缺失由会话服务判定，
/// 这里只校验各自的格式
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct PostMessageRequestDto {
    /// 文本内容
    #[validate(length(max = 4000, message = "body must be at most 4000 characters"))]
    pub body: Option<String>,
    /// 附件URL（外部对象存储）
    #[validate(url(message = "attachment_url must be a valid URL"))]
    pub attachment_url: Option<String>,
}
