use crate::domain::services::reward_service::{payout_period, PayoutOutcome, RewardService};
use crate::infrastructure::cache::redis_client::RedisClient;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 每周发放工作器
///
/// 定期唤醒并尝试当前周期的排行榜发放。周期的数据库唯一约束
/// 是幂等性的权威保证；Redis 咨询锁只是省掉多实例同时唤醒时
/// 注定空跑的事务。
pub struct PayoutWorker {
    rewards: Arc<RewardService>,
    redis: RedisClient,
    interval: Duration,
}

impl PayoutWorker {
    pub fn new(rewards: Arc<RewardService>, redis: RedisClient, check_interval: Duration) -> Self {
        Self {
            rewards,
            redis,
            interval: check_interval,
        }
    }

    /// 运行工作器
    pub async fn run(&self) {
        info!("Payout worker started");

        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;

            if let Err(e) = self.try_payout().await {
                error!("Payout tick failed: {}", e);
            }
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn try_payout(&self) -> anyhow::Result<()> {
        let period = payout_period(Utc::now());
        let lock_key = format!("payout:lock:{}", period);

        // 锁不可用时跳过本轮；锁只是优化，正确性在唯一约束
        match self.redis.try_lock(&lock_key, 600).await {
            Ok(true) => {}
            Ok(false) => {
                info!("Payout lock for {} held elsewhere, skipping tick", period);
                return Ok(());
            }
            Err(e) => {
                info!("Payout lock unavailable ({}), proceeding on DB guard", e);
            }
        }

        let outcome = self.rewards.weekly_payout(&period).await?;
        match outcome {
            PayoutOutcome::Paid { winners } => {
                info!("Weekly payout for {} paid {} winners", period, winners);
            }
            PayoutOutcome::AlreadyCompleted => {}
        }

        if let Err(e) = self.redis.unlock(&lock_key).await {
            info!("Failed to release payout lock for {}: {}", period, e);
        }

        Ok(())
    }
}
