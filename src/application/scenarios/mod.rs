// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 压测场景模块
///
/// - 表单协议（form_protocol）：写值并容忍预期对话框
/// - 订单流程（order_workflow）：创建并过账销售订单
/// - 页面场景（page_scenarios）：打开列表页面、随机查找客户
pub mod form_protocol;
pub mod order_workflow;
pub mod page_scenarios;


use crate::application::scenario_runner::Scenario;
use crate::config::settings::Settings;
use crate::domain::services::delay_timing::DelayTiming;
use crate::infrastructure::observability::transactions::TransactionSink;
use order_workflow::CreateAndPostSalesOrder;
use page_scenarios::{LookupRandomCustomer, OpenPage};
use serde::Deserialize;
use std::sync::Arc;

/// 可配置的场景
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    OpenSalesOrderList,
    OpenCustomerList,
    OpenItemList,
    LookupRandomCustomer,
    CreateAndPostSalesOrder,
}

/// 根据配置构建场景
pub fn build_scenario(
    kind: ScenarioKind,
    settings: &Settings,
    transactions: Arc<dyn TransactionSink>,
) -> Arc<dyn Scenario> {
    let pages = settings.pages;
    match kind {
        ScenarioKind::OpenSalesOrderList => {
            Arc::new(OpenPage::new(pages.sales_order_list, transactions))
        }
        ScenarioKind::OpenCustomerList => Arc::new(OpenPage::new(pages.customer_list, transactions)),
        ScenarioKind::OpenItemList => Arc::new(OpenPage::new(pages.item_list, transactions)),
        ScenarioKind::LookupRandomCustomer => {
            Arc::new(LookupRandomCustomer::new(pages.customer_list))
        }
        ScenarioKind::CreateAndPostSalesOrder => Arc::new(CreateAndPostSalesOrder::new(
            pages,
            DelayTiming::from_settings(&settings.delays),
            transactions,
        )),
    }
}
