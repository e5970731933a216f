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

use crate::domain::models::notification::{NotificationEvent, NotificationStatus};
use crate::domain::repositories::notification_repository::NotificationRepository;
use chrono::Utc;
use futures::StreamExt;
use hmac::{Hmac, Mac};
use metrics::{counter, histogram};
use reqwest::{header, Client};
use sha2::Sha256;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

use std::sync::Arc;

/// 通知投递工作器
///
/// 轮询发件箱中的待投递通知，签名后投递到推送网关。投递是
/// 带外的：失败按指数退避重试，重试耗尽进入死信状态，核心
/// 操作从不等待投递结果。
#[derive(Clone)]
pub struct NotificationWorker<R: NotificationRepository> {
    /// 发件箱仓库
    repo: Arc<R>,
    /// 推送网关URL
    gateway_url: String,
    /// 投递签名密钥
    secret: String,
    /// HTTP客户端
    client: Client,
}

impl<R: NotificationRepository> NotificationWorker<R> {
    /// 创建新的通知投递工作器实例
    ///
    /// # 参数
    ///
    /// * `repo` - 发件箱仓库
    /// * `gateway_url` - 推送网关URL
    /// * `secret` - 投递签名密钥
    pub fn new(repo: Arc<R>, gateway_url: String, secret: String) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("Leadrs-Push/0.1.0"),
        );
        Self {
            repo,
            gateway_url,
            secret,
            client: Client::builder().default_headers(headers).build().unwrap(),
        }
    }

    /// 运行通知投递循环
    pub async fn run(&self) {
        info!("Notification worker started");
        loop {
            if let Err(e) = self.process_pending().await {
                error!("Error processing notifications: {}", e);
            }
            sleep(Duration::from_secs(5)).await;
        }
    }

    /// 处理待投递的通知
    ///
    /// 从发件箱取一批待投递通知并发投递
    pub async fn process_pending(&self) -> anyhow::Result<()> {
        // Batch size
        let batch_size = 50;

        let events = self.repo.find_pending(batch_size).await?;

        if events.is_empty() {
            return Ok(());
        }

        info!("Processing {} pending notifications", events.len());

        // Process in parallel with bounded concurrency
        let worker = self;
        futures::stream::iter(events)
            .for_each_concurrent(10, |event| {
                let w = worker;
                async move {
                    if let Err(e) = w.deliver(event).await {
                        error!("Failed to deliver notification: {}", e);
                    }
                }
            })
            .await;

        Ok(())
    }

    async fn deliver(&self, mut event: NotificationEvent) -> anyhow::Result<()> {
        counter!("notification_delivery_attempts_total").increment(1);

        let start = std::time::Instant::now();

        let body = serde_json::json!({
            "id": event.id,
            "account_id": event.account_id,
            "event_type": event.event_type,
            "payload": event.payload,
        });

        // Create signature
        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(body.to_string().as_bytes());
        let signature_hex = hex::encode(mac.finalize().into_bytes());

        let response = self
            .client
            .post(&self.gateway_url)
            .header("X-Leadrs-Signature", signature_hex)
            .header("X-Leadrs-Event", event.event_type.to_string())
            .json(&body)
            .timeout(Duration::from_secs(10))
            .send()
            .await;

        let duration = start.elapsed();
        histogram!("notification_delivery_duration_seconds").record(duration.as_secs_f64());

        match response {
            Ok(resp) => {
                // Record response status
                event.response_status = Some(resp.status().as_u16() as i32);

                if resp.status().is_success() {
                    event.status = NotificationStatus::Delivered;
                    event.delivered_at = Some(Utc::now());

                    self.repo.update(&event).await?;
                    counter!("notification_delivery_success_total").increment(1);
                } else {
                    error!(
                        "Notification {} delivery failed with status: {}",
                        event.id,
                        resp.status()
                    );
                    self.handle_failure(event).await?;
                    counter!("notification_delivery_failed_total", "reason" => "http_error")
                        .increment(1);
                }
            }
            Err(e) => {
                // Network or other error
                error!("Notification {} delivery failed with error: {}", event.id, e);
                event.error_message = Some(e.to_string());
                self.handle_failure(event).await?;
                counter!("notification_delivery_failed_total", "reason" => "network_error")
                    .increment(1);
            }
        }

        Ok(())
    }

    async fn handle_failure(&self, mut event: NotificationEvent) -> anyhow::Result<()> {
        let new_attempt_count = event.attempt_count + 1;

        if new_attempt_count >= event.max_retries {
            event.status = NotificationStatus::Dead;
            info!(
                "Notification {} moved to dead letter state after {} retries",
                event.id, event.max_retries
            );
            counter!("notification_dead_letter_total").increment(1);
        } else {
            event.status = NotificationStatus::Failed;
            event.attempt_count = new_attempt_count;

            // Exponential backoff with jitter
            let base_backoff = 2u64.pow(new_attempt_count as u32);
            let jitter = rand::random_range(0..base_backoff / 2 + 1);
            let backoff = base_backoff + jitter;

            event.next_retry_at = Some(Utc::now() + chrono::Duration::seconds(backoff as i64));
        }

        self.repo.update(&event).await?;
        Ok(())
    }
}
