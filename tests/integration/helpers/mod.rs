// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use navload::application::scenario_runner::Scenario;
use navload::application::scenarios::order_workflow::CreateAndPostSalesOrder;
use navload::application::session_registry::SessionRegistry;
use navload::automation::simulated::{SimulatedApp, SimulatedConnector};
use navload::config::settings::PageSettings;
use navload::domain::models::Identity;
use navload::domain::services::delay_timing::DelayTiming;
use navload::infrastructure::observability::transactions::RecordingTransactionSink;
use std::sync::Arc;

pub const PASSWORD: &str = "secret";

#[allow(dead_code)]
pub struct TestRun {
    pub connector: SimulatedConnector,
    pub registry: Arc<SessionRegistry>,
    pub sink: Arc<RecordingTransactionSink>,
}

/// 带两个登录用户的演示后端
pub fn demo_app() -> SimulatedApp {
    SimulatedApp::demo(PageSettings::default())
        .with_user("ORDERPROC", PASSWORD)
        .with_user("SALESREP", PASSWORD)
}

pub fn identities() -> Vec<Identity> {
    vec![
        Identity::credentials("ORDERPROC", PASSWORD),
        Identity::credentials("SALESREP", PASSWORD),
    ]
}

pub fn create_test_run(app: SimulatedApp) -> TestRun {
    let connector = SimulatedConnector::new(app);
    let registry = Arc::new(SessionRegistry::new(Arc::new(connector.clone())));
    TestRun {
        connector,
        registry,
        sink: Arc::new(RecordingTransactionSink::new()),
    }
}

/// 不带延迟的订单流程
pub fn order_workflow(run: &TestRun) -> Arc<dyn Scenario> {
    Arc::new(CreateAndPostSalesOrder::new(
        PageSettings::default(),
        DelayTiming::none(),
        run.sink.clone(),
    ))
}
