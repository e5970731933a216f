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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含数据库、Redis、服务器、速率限制、推送网关、支付回调
/// 与发放调度等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// Redis配置
    pub redis: RedisSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 速率限制配置
    pub rate_limiting: RateLimitingSettings,
    /// 推送网关配置
    pub push: PushSettings,
    /// 支付回调配置
    pub payment: PaymentSettings,
    /// 发放调度配置
    pub payout: PayoutSettings,
    /// 内容审查配置
    pub moderation: ModerationSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// Redis配置设置
#[derive(Debug, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL
    pub url: String,
}

/// 服务器配置设置
#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 速率限制配置设置
#[derive(Debug, Deserialize)]
pub struct RateLimitingSettings {
    /// 是否启用速率限制
    pub enabled: bool,
    /// 默认每分钟请求数限制
    pub default_rpm: u32,
}

/// 推送网关配置设置
#[derive(Debug, Deserialize)]
pub struct PushSettings {
    /// 推送网关URL，通知工作器的投递目标
    pub gateway_url: String,
    /// 投递签名密钥
    pub secret: String,
}

/// 支付回调配置设置
#[derive(Debug, Deserialize)]
pub struct PaymentSettings {
    /// 支付处理器回调的签名验证密钥
    pub webhook_secret: String,
}

/// 发放调度配置设置
#[derive(Debug, Deserialize)]
pub struct PayoutSettings {
    /// 发放检查间隔（秒）
    ///
    /// 工作器按该间隔唤醒，仅当当前周期尚未发放时才执行
    pub check_interval: u64,
}

/// 内容审查配置设置
#[derive(Debug, Deserialize)]
pub struct ModerationSettings {
    /// 兜底屏蔽词表；权威词表由外部审查服务持有
    pub blocked_words: Vec<String>,
}

/// 指标导出配置设置
#[derive(Debug, Deserialize)]
pub struct MetricsSettings {
    /// Prometheus 导出器监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Default DB pool settings
            .set_default("database.max_connections", 100)?
            .set_default("database.min_connections", 10)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default Rate Limiting settings
            .set_default("rate_limiting.enabled", true)?
            .set_default("rate_limiting.default_rpm", 100)?
            // Default Push settings
            .set_default("push.gateway_url", "http://localhost:8800/push")?
            .set_default("push.secret", "your-secret-key")?
            // Default Payment settings
            .set_default("payment.webhook_secret", "your-payment-secret")?
            // Payout worker checks hourly; the run itself is weekly and idempotent
            .set_default("payout.check_interval", 3600)?
            // Default Moderation settings
            .set_default("moderation.blocked_words", Vec::<String>::new())?
            // Default Metrics settings
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("LEADRS").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
