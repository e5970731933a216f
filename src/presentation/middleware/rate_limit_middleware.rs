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

use crate::infrastructure::cache::redis_client::RedisClient;
use thiserror::Error;

/// 速率限制错误类型
#[derive(Error, Debug)]
pub enum RateLimitError {
    /// 请求过多错误
    #[error("Too many requests")]
    TooManyRequests,

    /// 内部服务器错误
    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// 速率限制器
///
/// 基于 Redis 的固定窗口计数器，多实例共享同一份计数
pub struct RateLimiter {
    /// Redis客户端
    redis_client: RedisClient,

    /// 默认每分钟限制请求数
    default_limit_per_minute: u32,

    /// 是否启用；禁用时所有检查直接放行
    enabled: bool,
}

impl RateLimiter {
    /// 创建新的速率限制器实例
    ///
    /// # 参数
    ///
    /// * `redis_client` - Redis客户端实例
    /// * `default_limit_per_minute` - 默认每分钟请求数限制
    /// * `enabled` - 是否启用
    pub fn new(redis_client: RedisClient, default_limit_per_minute: u32, enabled: bool) -> Self {
        Self {
            redis_client,
            default_limit_per_minute,
            enabled,
        }
    }

    /// 检查账户的请求速率是否超出限制
    ///
    /// # 参数
    ///
    /// * `account_key` - 账户标识
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 请求未超出限制
    /// * `Err(RateLimitError)` - 请求超出限制或发生错误
    pub async fn check(&self, account_key: &str) -> Result<(), RateLimitError> {
        if !self.enabled {
            return Ok(());
        }

        let key = format!("rate_limit:{}", account_key);
        let current_requests = self
            .redis_client
            .incr(&key)
            .await
            .map_err(|e| RateLimitError::InternalError(format!("Redis INCR failed: {}", e)))?;

        // 新窗口的第一个请求设置过期，窗口到期计数自动清零
        if current_requests == 1 {
            self.redis_client.expire(&key, 60).await.map_err(|e| {
                RateLimitError::InternalError(format!("Redis EXPIRE failed: {}", e))
            })?;
        }

        let limit = self.get_rate_limit(account_key).await?;

        if current_requests > limit.into() {
            return Err(RateLimitError::TooManyRequests);
        }

        Ok(())
    }

    /// 获取账户的速率限制配置
    async fn get_rate_limit(&self, account_key: &str) -> Result<u32, RateLimitError> {
        let key = format!("rate_limit_config:{}", account_key);
        match self.redis_client.get(&key).await {
            Ok(Some(limit_str)) => limit_str.parse::<u32>().map_err(|e| {
                RateLimitError::InternalError(format!("Failed to parse rate limit: {}", e))
            }),
            Ok(None) => Ok(self.default_limit_per_minute),
            Err(e) => Err(RateLimitError::InternalError(format!(
                "Redis GET failed: {}",
                e
            ))),
        }
    }
}
