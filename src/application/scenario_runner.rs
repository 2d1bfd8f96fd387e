// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::session_registry::Session;
use crate::automation::UiSession;
use crate::domain::models::ScenarioOutcome;
use crate::infrastructure::metrics::{SCENARIO_DURATION, SCENARIO_OUTCOMES};
use crate::utils::errors::ScenarioError;
use async_trait::async_trait;
use metrics::{counter, histogram};
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// 一次场景执行的上下文
pub struct ScenarioContext {
    pub session: Arc<Session>,
    pub rng: StdRng,
    /// 虚拟用户编号
    pub virtual_user: usize,
    /// 当前迭代次数（从 0 开始）
    pub iteration: u64,
}

impl ScenarioContext {
    pub fn new(session: Arc<Session>, rng: StdRng, virtual_user: usize) -> Self {
        Self {
            session,
            rng,
            virtual_user,
            iteration: 0,
        }
    }

    pub fn client(&self) -> &dyn UiSession {
        self.session.client()
    }
}

/// 场景特质
///
/// 对一个已登录会话执行一次完整的用户操作
#[async_trait]
pub trait Scenario: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, ctx: &mut ScenarioContext) -> Result<(), ScenarioError>;
}

/// 场景执行器
///
/// 执行一次场景并把结果映射为 Pass / Fail / Inconclusive，不做重试
#[derive(Clone)]
pub struct ScenarioRunner {
    scenario: Arc<dyn Scenario>,
}

impl ScenarioRunner {
    pub fn new(scenario: Arc<dyn Scenario>) -> Self {
        Self { scenario }
    }

    pub fn scenario_name(&self) -> &str {
        self.scenario.name()
    }

    #[instrument(
        skip_all,
        fields(
            scenario = self.scenario.name(),
            vu = ctx.virtual_user,
            iteration = ctx.iteration
        )
    )]
    pub async fn run(&self, ctx: &mut ScenarioContext) -> ScenarioOutcome {
        let name = self.scenario.name().to_string();
        let start = Instant::now();

        let outcome = match self.scenario.execute(ctx).await {
            Ok(()) => ScenarioOutcome::Pass,
            Err(e) if e.is_inconclusive() => ScenarioOutcome::Inconclusive(e.to_string()),
            Err(e) => {
                error!(kind = e.kind(), "Scenario failed: {}", e);
                ScenarioOutcome::Fail(e.to_string())
            }
        };
        let elapsed = start.elapsed();

        match &outcome {
            ScenarioOutcome::Pass => {
                info!(elapsed_ms = elapsed.as_millis() as u64, "Scenario passed")
            }
            ScenarioOutcome::Inconclusive(reason) => warn!("Scenario inconclusive: {}", reason),
            ScenarioOutcome::Fail(_) => {}
        }

        counter!(SCENARIO_OUTCOMES, "scenario" => name.clone(), "outcome" => outcome.label())
            .increment(1);
        histogram!(SCENARIO_DURATION, "scenario" => name).record(elapsed.as_secs_f64());

        outcome
    }
}
