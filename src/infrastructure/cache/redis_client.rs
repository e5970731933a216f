// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use redis::AsyncCommands;

/// Redis客户端
///
/// 提供对Redis数据库的异步操作接口，用于分布式速率限制
/// 与每周发放的进程间咨询锁
#[derive(Clone)]
pub struct RedisClient {
    /// Redis客户端
    client: redis::Client,
}

impl RedisClient {
    /// 创建新的Redis客户端实例
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisClient)` - Redis客户端实例
    /// * `Err(anyhow::Error)` - 创建过程中出现的错误
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// 获取指定键的值
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = con.get(key).await?;
        Ok(value)
    }

    /// 永久设置键值对
    pub async fn set_forever(&self, key: &str, value: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    /// 设置键的过期时间
    ///
    /// # 参数
    ///
    /// * `key` - 键
    /// * `seconds` - 过期时间（秒）
    pub async fn expire(&self, key: &str, seconds: usize) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.expire::<_, ()>(key, seconds as i64).await?;
        Ok(())
    }

    /// 增加键的值
    ///
    /// # 返回值
    ///
    /// * `Ok(i64)` - 增加后的值
    pub async fn incr(&self, key: &str) -> Result<i64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: i64 = con.incr(key, 1).await?;
        Ok(value)
    }

    /// 尝试获取带过期时间的咨询锁（SET NX EX）
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 获得锁
    /// * `Ok(false)` - 锁已被其他持有者占用
    pub async fn try_lock(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let acquired: bool = redis::cmd("SET")
            .arg(key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async::<Option<String>>(&mut con)
            .await?
            .is_some();
        Ok(acquired)
    }

    /// 释放咨询锁
    pub async fn unlock(&self, key: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.del::<_, ()>(key).await?;
        Ok(())
    }
}
