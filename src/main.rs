// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::bail;
use navload::application::scenarios::build_scenario;
use navload::application::session_registry::SessionRegistry;
use navload::automation::simulated::{SimulatedApp, SimulatedConnector};
use navload::automation::SessionConnector;
use navload::config::settings::Settings;
use navload::domain::models::Identity;
use navload::infrastructure::observability::transactions::MetricsTransactionSink;
use navload::utils::telemetry;
use navload::workers::manager::LoadManager;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 主函数
///
/// 加载配置，启动虚拟用户并在结束后输出结果汇总
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting navload...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    // 3. Initialize Prometheus Metrics
    navload::infrastructure::metrics::init_metrics(&settings.metrics);

    // 4. Resolve identities and the session connector
    let identities = settings.identities();
    if identities.is_empty() {
        bail!("No identities configured: set service.users or service.use_platform_identity");
    }
    let connector = connector_for(&settings, &identities)?;
    let registry = Arc::new(SessionRegistry::new(connector));

    // 5. Build the scenario
    let scenario = build_scenario(
        settings.load.scenario,
        &settings,
        Arc::new(MetricsTransactionSink),
    );
    info!(
        "Scenario {} with {} virtual users",
        scenario.name(),
        settings.load.virtual_users
    );

    // 6. Start virtual users
    let mut manager = LoadManager::new(
        registry,
        scenario,
        identities,
        settings.load.iterations,
        settings.load.seed,
    );
    manager.start_workers(settings.load.virtual_users)?;

    // 7. Wait for completion and report
    let summary = manager
        .wait_for_completion(settings.load.duration_secs.map(Duration::from_secs))
        .await;
    info!(
        "Run complete: {} passed, {} failed, {} inconclusive",
        summary.pass, summary.fail, summary.inconclusive
    );

    Ok(())
}

fn connector_for(
    settings: &Settings,
    identities: &[Identity],
) -> anyhow::Result<Arc<dyn SessionConnector>> {
    let endpoint = &settings.service.endpoint;
    if !endpoint.starts_with("sim:") {
        bail!(
            "Unsupported service endpoint '{}': only the simulated backend (sim://) is available",
            endpoint
        );
    }

    let app = identities.iter().fold(
        SimulatedApp::demo(settings.pages).with_latency(Duration::from_millis(5)),
        |app, identity| match identity {
            Identity::Credentials { username, password } => app.with_user(username, password),
            Identity::Platform => app,
        },
    );
    info!("Using simulated backend at {}", endpoint);

    Ok(Arc::new(SimulatedConnector::new(app)))
}
