// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use backoff::ExponentialBackoff;
use sea_orm::DbErr;
use std::time::Duration;

/// 瞬时存储错误的重试策略
///
/// 有界指数退避：预算用尽后错误原样浮出，由调用方映射为
/// 重试耗尽错误。
pub fn store_retry_policy() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(100),
        max_interval: Duration::from_secs(2),
        multiplier: 2.0,
        max_elapsed_time: Some(Duration::from_secs(5)),
        ..ExponentialBackoff::default()
    }
}

/// 判断存储错误是否为瞬时错误
///
/// 连接获取失败与网络类错误可重试；约束冲突、记录未找到等
/// 业务性失败不可重试——那是真实的状态变化，重试只会重复同一结果。
pub fn is_transient_store_error(err: &DbErr) -> bool {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => true,
        DbErr::Exec(_) | DbErr::Query(_) => {
            let message = err.to_string().to_lowercase();
            let retryable_patterns = [
                "timeout",
                "connection reset",
                "connection refused",
                "broken pipe",
                "too many connections",
                "deadlock",
            ];
            retryable_patterns.iter().any(|p| message.contains(p))
        }
        _ => false,
    }
}
