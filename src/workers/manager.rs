// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::scenario_runner::{Scenario, ScenarioRunner};
use crate::application::session_registry::SessionRegistry;
use crate::domain::models::Identity;
use crate::utils::errors::WorkerError;
use crate::workers::virtual_user::{LoadSummary, OutcomeTally, VirtualUser};
use crate::workers::worker::Worker;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 负载管理器
///
/// 启动虚拟用户，等待它们结束、运行时长耗尽或收到关闭信号，
/// 然后关闭所有会话并汇总结果
pub struct LoadManager {
    registry: Arc<SessionRegistry>,
    runner: ScenarioRunner,
    identities: Vec<Identity>,
    iterations: Option<u64>,
    seed: Option<u64>,
    tally: Arc<OutcomeTally>,
    handles: Vec<JoinHandle<()>>,
}

impl LoadManager {
    pub fn new(
        registry: Arc<SessionRegistry>,
        scenario: Arc<dyn Scenario>,
        identities: Vec<Identity>,
        iterations: Option<u64>,
        seed: Option<u64>,
    ) -> Self {
        Self {
            registry,
            runner: ScenarioRunner::new(scenario),
            identities,
            iterations,
            seed,
            tally: Arc::new(OutcomeTally::new()),
            handles: Vec::new(),
        }
    }

    /// 启动虚拟用户
    ///
    /// 第 `i` 个虚拟用户使用 `identities[i % len]`
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的虚拟用户数量
    pub fn start_workers(&mut self, count: usize) -> Result<(), WorkerError> {
        if self.identities.is_empty() {
            return Err(WorkerError::SessionError(
                "no identities configured".to_string(),
            ));
        }

        for id in 0..count {
            let identity = self.identities[id % self.identities.len()].clone();
            let worker = VirtualUser::new(
                id,
                identity,
                self.registry.clone(),
                self.runner.clone(),
                self.iterations,
                self.seed,
                self.tally.clone(),
            );

            let tally = self.tally.clone();
            let handle = tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    error!("Virtual user {} stopped: {}", worker.name(), e);
                    tally.record_failure();
                }
            });
            self.handles.push(handle);
        }

        info!("Started {} virtual users", count);
        Ok(())
    }

    /// 等待运行结束并关闭所有会话
    ///
    /// 所有虚拟用户完成、`duration` 耗尽或收到 Ctrl-C 时结束，
    /// 剩余的虚拟用户会被中止
    pub async fn wait_for_completion(&mut self, duration: Option<Duration>) -> LoadSummary {
        let handles = std::mem::take(&mut self.handles);
        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();

        let deadline = async {
            match duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };
        let shutdown = async {
            if let Err(err) = signal::ctrl_c().await {
                error!("Unable to listen for shutdown signal: {}", err);
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            results = join_all(handles) => {
                for result in results {
                    if let Err(e) = result {
                        error!("Virtual user task failed: {}", e);
                        self.tally.record_failure();
                    }
                }
                info!("All virtual users finished");
            }
            _ = deadline => info!("Run duration elapsed"),
            _ = shutdown => info!("Shutdown signal received"),
        }

        info!("Shutting down virtual users...");
        for abort in &aborts {
            abort.abort();
        }

        let closed = self.registry.close_all().await;
        let summary = self.tally.summary();
        info!(
            sessions_closed = closed,
            pass = summary.pass,
            fail = summary.fail,
            inconclusive = summary.inconclusive,
            "Load run finished"
        );
        summary
    }
}
