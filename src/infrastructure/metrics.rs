// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

pub const SCENARIO_OUTCOMES: &str = "navload_scenario_outcomes_total";
pub const SCENARIO_DURATION: &str = "navload_scenario_duration_seconds";
pub const TRANSACTION_DURATION: &str = "navload_transaction_duration_seconds";

/// 初始化指标系统
///
/// 未启用时只注册指标描述；启用时在配置的地址上启动 Prometheus 导出器
pub fn init_metrics(settings: &MetricsSettings) {
    if settings.enabled {
        match settings.listen_address.parse::<SocketAddr>() {
            Ok(addr) => {
                // Ignore error if address is already in use (for development/testing)
                if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
                    warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
                } else {
                    info!("Metrics exporter listening on {}", addr);
                }
            }
            Err(e) => warn!(
                "Invalid metrics listen address '{}': {}",
                settings.listen_address, e
            ),
        }
    }

    describe_counter!(SCENARIO_OUTCOMES, "Scenario executions by outcome");
    describe_histogram!(
        SCENARIO_DURATION,
        Unit::Seconds,
        "Wall-clock duration of one scenario execution"
    );
    describe_histogram!(
        TRANSACTION_DURATION,
        Unit::Seconds,
        "Duration of named timing spans inside a scenario"
    );
}
