// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// 安装 Prometheus 导出器
///
/// 核心路径（购买、消息、发放、通知投递）上的计数器与直方图
/// 通过该导出器暴露。地址已被占用时降级为警告，便于本地多实例
/// 与测试运行。
pub fn init_metrics(listen_addr: &str) {
    let addr: SocketAddr = match listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::warn!("Invalid metrics listen address {}: {}", listen_addr, e);
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        tracing::warn!("Failed to install Prometheus recorder: {}", e);
        return;
    }

    info!("Metrics exporter listening on {}", addr);
}
