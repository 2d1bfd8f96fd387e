// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_run, demo_app, identities, order_workflow};
use navload::domain::models::Identity;
use navload::workers::manager::LoadManager;
use navload::workers::virtual_user::LoadSummary;
use std::time::Duration;

#[tokio::test]
async fn test_iteration_budget_runs_every_virtual_user() {
    let run = create_test_run(demo_app());
    let mut manager = LoadManager::new(
        run.registry.clone(),
        order_workflow(&run),
        identities(),
        Some(3),
        Some(42),
    );

    manager.start_workers(4).unwrap();
    let summary = manager.wait_for_completion(None).await;

    assert_eq!(
        summary,
        LoadSummary {
            pass: 12,
            fail: 0,
            inconclusive: 0
        }
    );
    // Four virtual users share two identities.
    assert_eq!(run.connector.connect_count(), 2);
    assert_eq!(run.connector.closed_sessions(), 2);
    assert_eq!(run.connector.posted_orders().len(), 12);
    assert!(run.registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_duration_stops_open_ended_run() {
    let run = create_test_run(demo_app().with_latency(Duration::from_millis(1)));
    let mut manager = LoadManager::new(
        run.registry.clone(),
        order_workflow(&run),
        identities(),
        None,
        Some(7),
    );

    manager.start_workers(2).unwrap();
    let summary = manager
        .wait_for_completion(Some(Duration::from_millis(500)))
        .await;

    assert!(summary.total() > 0);
    assert_eq!(summary.fail, 0);
    assert_eq!(run.connector.closed_sessions(), 2);
}

#[tokio::test]
async fn test_authentication_failure_ends_only_that_user() {
    let run = create_test_run(demo_app());
    let mut manager = LoadManager::new(
        run.registry.clone(),
        order_workflow(&run),
        vec![
            Identity::credentials("ORDERPROC", "secret"),
            Identity::credentials("SALESREP", "wrong"),
        ],
        Some(2),
        Some(1),
    );

    manager.start_workers(2).unwrap();
    let summary = manager.wait_for_completion(None).await;

    assert_eq!(summary.pass, 2);
    assert_eq!(summary.fail, 1);
    assert_eq!(run.connector.connect_count(), 1);
    assert_eq!(run.connector.closed_sessions(), 1);
}

#[tokio::test]
async fn test_same_seed_reproduces_run() {
    let mut posted = Vec::new();
    for _ in 0..2 {
        let run = create_test_run(demo_app());
        let mut manager = LoadManager::new(
            run.registry.clone(),
            order_workflow(&run),
            vec![Identity::credentials("ORDERPROC", "secret")],
            Some(3),
            Some(2025),
        );
        manager.start_workers(1).unwrap();
        manager.wait_for_completion(None).await;
        posted.push(run.connector.posted_orders());
    }

    assert_eq!(posted[0].len(), 3);
    assert_eq!(posted[0], posted[1]);
}

#[tokio::test]
async fn test_no_identities_is_rejected() {
    let run = create_test_run(demo_app());
    let mut manager = LoadManager::new(
        run.registry.clone(),
        order_workflow(&run),
        Vec::new(),
        Some(1),
        None,
    );

    assert!(manager.start_workers(1).is_err());
}
