// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_run, demo_app, identities};
use navload::application::scenario_runner::{ScenarioContext, ScenarioRunner};
use navload::application::scenarios::{build_scenario, ScenarioKind};
use navload::config::settings::Settings;
use navload::domain::models::ScenarioOutcome;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::time::Instant;

fn default_settings() -> Settings {
    let dir = tempfile::tempdir().unwrap();
    Settings::from_dir(dir.path()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_every_configured_scenario_passes() {
    let settings = default_settings();
    let kinds = [
        (ScenarioKind::OpenSalesOrderList, "OpenPage9305"),
        (ScenarioKind::OpenCustomerList, "OpenPage22"),
        (ScenarioKind::OpenItemList, "OpenPage31"),
        (ScenarioKind::LookupRandomCustomer, "LookupRandomCustomer"),
        (ScenarioKind::CreateAndPostSalesOrder, "CreateAndPostSalesOrder"),
    ];

    for (kind, name) in kinds {
        let run = create_test_run(demo_app());
        let session = run.registry.acquire(&identities()[0]).await.unwrap();
        let runner = ScenarioRunner::new(build_scenario(kind, &settings, run.sink.clone()));
        let mut ctx = ScenarioContext::new(session, StdRng::seed_from_u64(8), 0);

        assert_eq!(runner.scenario_name(), name);
        assert_eq!(runner.run(&mut ctx).await, ScenarioOutcome::Pass, "{}", name);
        assert!(ctx.session.open_forms().is_empty(), "{} left forms open", name);
        assert_eq!(run.registry.close_all().await, 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_order_workflow_paces_with_configured_delays() {
    let settings = default_settings();
    let run = create_test_run(demo_app());
    let session = run.registry.acquire(&identities()[0]).await.unwrap();
    let runner = ScenarioRunner::new(build_scenario(
        ScenarioKind::CreateAndPostSalesOrder,
        &settings,
        run.sink.clone(),
    ));
    let mut ctx = ScenarioContext::new(session, StdRng::seed_from_u64(8), 0);

    let start = Instant::now();
    assert_eq!(runner.run(&mut ctx).await, ScenarioOutcome::Pass);

    // At least two lines, each followed by a think delay of 800ms or more.
    assert!(start.elapsed() >= Duration::from_millis(1600));
    let order = &run.connector.posted_orders()[0];
    let think_floor = Duration::from_millis(800 * order.lines.len() as u64);
    assert!(start.elapsed() >= think_floor);
}
