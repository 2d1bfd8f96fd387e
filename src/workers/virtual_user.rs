// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::scenario_runner::{ScenarioContext, ScenarioRunner};
use crate::application::session_registry::SessionRegistry;
use crate::domain::models::{Identity, ScenarioOutcome};
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// 一次压测运行的结果汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub pass: u64,
    pub fail: u64,
    pub inconclusive: u64,
}

impl LoadSummary {
    pub fn total(&self) -> u64 {
        self.pass + self.fail + self.inconclusive
    }
}

/// 所有虚拟用户共享的结果计数
#[derive(Debug, Default)]
pub struct OutcomeTally {
    pass: AtomicU64,
    fail: AtomicU64,
    inconclusive: AtomicU64,
}

impl OutcomeTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: &ScenarioOutcome) {
        let counter = match outcome {
            ScenarioOutcome::Pass => &self.pass,
            ScenarioOutcome::Fail(_) => &self.fail,
            ScenarioOutcome::Inconclusive(_) => &self.inconclusive,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一次场景之外的失败（登录失败、任务崩溃）
    pub fn record_failure(&self) {
        self.fail.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            pass: self.pass.load(Ordering::Relaxed),
            fail: self.fail.load(Ordering::Relaxed),
            inconclusive: self.inconclusive.load(Ordering::Relaxed),
        }
    }
}

/// 虚拟用户
///
/// 绑定一个身份，获取会话后反复执行场景
pub struct VirtualUser {
    id: usize,
    name: String,
    identity: Identity,
    registry: Arc<SessionRegistry>,
    runner: ScenarioRunner,
    iterations: Option<u64>,
    seed: Option<u64>,
    tally: Arc<OutcomeTally>,
}

impl VirtualUser {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        identity: Identity,
        registry: Arc<SessionRegistry>,
        runner: ScenarioRunner,
        iterations: Option<u64>,
        seed: Option<u64>,
        tally: Arc<OutcomeTally>,
    ) -> Self {
        Self {
            id,
            name: format!("vu-{}", id),
            identity,
            registry,
            runner,
            iterations,
            seed,
            tally,
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(self.id as u64)),
            None => StdRng::from_os_rng(),
        }
    }
}

#[async_trait]
impl Worker for VirtualUser {
    async fn run(&self) -> Result<u64, WorkerError> {
        info!(
            "Virtual user {} started as {} running {}",
            self.name,
            self.identity,
            self.runner.scenario_name()
        );

        let session = self.registry.acquire(&self.identity).await?;
        let mut ctx = ScenarioContext::new(session, self.rng(), self.id);

        while self.iterations.map_or(true, |limit| ctx.iteration < limit) {
            if ctx.session.is_closed() {
                warn!("Virtual user {} stopping: session closed", self.name);
                break;
            }

            let outcome = self.runner.run(&mut ctx).await;
            self.tally.record(&outcome);
            ctx.iteration += 1;

            tokio::task::yield_now().await;
        }

        info!(
            "Virtual user {} finished after {} iterations",
            self.name, ctx.iteration
        );
        Ok(ctx.iteration)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
