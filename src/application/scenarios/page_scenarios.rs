// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::scenario_runner::{Scenario, ScenarioContext};
use crate::automation::PageId;
use crate::domain::services::random_selector::select_random;
use crate::infrastructure::observability::transactions::{TimingSpan, TransactionSink};
use crate::utils::errors::ScenarioError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// 打开并关闭一个页面，计时事务名为 `OpenPage<id>`
pub struct OpenPage {
    name: String,
    page: PageId,
    transactions: Arc<dyn TransactionSink>,
}

impl OpenPage {
    pub fn new(page: PageId, transactions: Arc<dyn TransactionSink>) -> Self {
        Self {
            name: format!("OpenPage{}", page),
            page,
            transactions,
        }
    }
}

#[async_trait]
impl Scenario for OpenPage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut ScenarioContext) -> Result<(), ScenarioError> {
        let client = ctx.client();
        let span = TimingSpan::begin(self.name.as_str(), self.transactions.clone());
        let form = client.open_page(self.page).await?;
        span.end();

        client.close_form(&form).await?;
        Ok(())
    }
}

/// 在客户列表中随机查找一个客户
pub struct LookupRandomCustomer {
    customer_list: PageId,
}

impl LookupRandomCustomer {
    pub fn new(customer_list: PageId) -> Self {
        Self { customer_list }
    }
}

#[async_trait]
impl Scenario for LookupRandomCustomer {
    fn name(&self) -> &str {
        "LookupRandomCustomer"
    }

    async fn execute(&self, ctx: &mut ScenarioContext) -> Result<(), ScenarioError> {
        let session = ctx.session.clone();
        match select_random(session.client(), self.customer_list, "No.", &mut ctx.rng).await {
            Ok(customer) => {
                debug!(customer = %customer, "Customer found");
                Ok(())
            }
            Err(ScenarioError::EmptySelection { .. }) => {
                Err(ScenarioError::Failed("No customer selected".to_string()))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::scenario_runner::ScenarioRunner;
    use crate::application::session_registry::Session;
    use crate::automation::simulated::{SimulatedApp, SimulatedConnector};
    use crate::automation::SessionConnector;
    use crate::config::settings::PageSettings;
    use crate::domain::models::{Identity, ScenarioOutcome};
    use crate::infrastructure::observability::transactions::RecordingTransactionSink;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    async fn context(app: SimulatedApp) -> ScenarioContext {
        let client = SimulatedConnector::new(app)
            .connect(&Identity::Platform)
            .await
            .unwrap();
        let session = Arc::new(Session::new(Identity::Platform, client));
        ScenarioContext::new(session, StdRng::seed_from_u64(3), 0)
    }

    #[tokio::test]
    async fn test_open_page_records_span_and_closes_page() {
        let mut ctx = context(SimulatedApp::demo(PageSettings::default())).await;
        let sink = Arc::new(RecordingTransactionSink::new());
        let runner = ScenarioRunner::new(Arc::new(OpenPage::new(9305, sink.clone())));

        assert_eq!(runner.scenario_name(), "OpenPage9305");
        assert_eq!(runner.run(&mut ctx).await, ScenarioOutcome::Pass);
        assert_eq!(sink.names(), vec!["OpenPage9305".to_string()]);
        assert!(ctx.session.open_forms().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_without_customers_fails() {
        let app = SimulatedApp::new(PageSettings::default());
        let mut ctx = context(app).await;
        let runner = ScenarioRunner::new(Arc::new(LookupRandomCustomer::new(22)));

        assert_eq!(
            runner.run(&mut ctx).await,
            ScenarioOutcome::Fail("No customer selected".to_string())
        );
    }
}
