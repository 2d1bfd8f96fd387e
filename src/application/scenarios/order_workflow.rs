// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::scenario_runner::{Scenario, ScenarioContext};
use crate::application::scenarios::form_protocol::{
    close_quietly, dismiss_dialog, reject_interaction, set_and_expect_optional_dialog,
};
use crate::automation::{DialogKind, FormHandle, Interaction, UiSession};
use crate::config::settings::PageSettings;
use crate::domain::models::{SalesLine, SalesOrder};
use crate::domain::services::delay_timing::DelayTiming;
use crate::domain::services::random_selector::select_random;
use crate::infrastructure::observability::transactions::{TimingSpan, TransactionSink};
use crate::utils::errors::ScenarioError;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const NEW_SALES_ORDER: &str = "Sales Order";
const POST: &str = "Post...";

const ORDER_NO: &str = "No.";
const CUSTOMER_NO: &str = "Customer No.";
const ACTIVITY_CODE: &str = "Activity Code";
const LINE_TYPE: &str = "Type";
const LINE_NO: &str = "No.";
const QUANTITY: &str = "Quantity";
const QTY_TO_SHIP: &str = "Qty. to Ship";

const ITEM_LINE: &str = "Item";
const CUSTOMER_KEY: &str = "No.";
const ITEM_KEY: &str = "No.";
const ACTIVITY_KEY: &str = "Code";

pub const POST_SPAN: &str = "Post";
pub const CONFIRM_SPAN: &str = "ConfirmShipAndInvoice";
pub const MISSING_POST_DIALOG: &str = "Post dialog can't be found";

/// 订单行数范围 [2, 6)
const LINE_COUNT: std::ops::Range<usize> = 2..6;
/// 数量范围 [1, 10)
const QUANTITY_RANGE: std::ops::Range<u32> = 1..10;

/// 订单流程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Start,
    HeaderCreating,
    HeaderCommitted,
    LinesEntering(usize),
    LinesValidated,
    Posting,
    PostResolved,
    Closed,
}

/// 创建并过账销售订单
///
/// 从角色中心新建订单，随机选取客户、活动代码、物料和数量，
/// 录入 2 到 5 行后过账。过账确认框缺失时结果为不确定。
pub struct CreateAndPostSalesOrder {
    pages: PageSettings,
    delays: DelayTiming,
    transactions: Arc<dyn TransactionSink>,
}

impl CreateAndPostSalesOrder {
    pub fn new(
        pages: PageSettings,
        delays: DelayTiming,
        transactions: Arc<dyn TransactionSink>,
    ) -> Self {
        Self {
            pages,
            delays,
            transactions,
        }
    }

    /// 执行一次完整流程，返回已过账订单的摘要
    ///
    /// 订单表单在成功和不确定时正常关闭，失败时尽力关闭。
    #[instrument(skip_all, fields(vu = ctx.virtual_user, iteration = ctx.iteration))]
    pub async fn create_and_post(
        &self,
        ctx: &mut ScenarioContext,
    ) -> Result<SalesOrder, ScenarioError> {
        let session = ctx.session.clone();
        let client = session.client();
        let rng = &mut ctx.rng;
        let mut state = OrderState::Start;

        let customer = select_random(client, self.pages.customer_list, CUSTOMER_KEY, rng).await?;
        let activity_code =
            select_random(client, self.pages.activity_code_list, ACTIVITY_KEY, rng).await?;

        transition(&mut state, OrderState::HeaderCreating);
        let order_form = self.open_new_order(client).await?;

        let result = self
            .fill_and_post(client, &order_form, &customer, &activity_code, rng, &mut state)
            .await;

        match result {
            Ok(order) => {
                client.close_form(&order_form).await?;
                transition(&mut state, OrderState::Closed);
                info!(
                    order_no = %order.order_no,
                    customer = %order.customer_no,
                    lines = order.lines.len(),
                    quantity = order.total_quantity(),
                    "Sales order posted"
                );
                Ok(order)
            }
            Err(e) => {
                close_quietly(client, &order_form).await;
                Err(e)
            }
        }
    }

    async fn open_new_order(&self, client: &dyn UiSession) -> Result<FormHandle, ScenarioError> {
        let role_center = client.role_center();
        match client.invoke_action(&role_center, NEW_SALES_ORDER).await? {
            Interaction::NewForm(form) if form.page_id == Some(self.pages.sales_order) => Ok(form),
            Interaction::NewForm(form) => {
                close_quietly(client, &form).await;
                Err(ScenarioError::WrongPage {
                    expected: self.pages.sales_order,
                    actual: form.page_id,
                    caption: form.caption,
                })
            }
            other => Err(reject_interaction(client, other, NEW_SALES_ORDER).await),
        }
    }

    async fn fill_and_post<R>(
        &self,
        client: &dyn UiSession,
        form: &FormHandle,
        customer: &str,
        activity_code: &str,
        rng: &mut R,
        state: &mut OrderState,
    ) -> Result<SalesOrder, ScenarioError>
    where
        R: Rng + ?Sized,
    {
        // Focus side effects create the header record.
        client.activate(form, ORDER_NO).await?;
        client.activate(form, CUSTOMER_NO).await?;
        let order_no = client.get_value(form, ORDER_NO).await?;
        info!(order_no = %order_no, "Sales order created");

        let customer_no = self
            .set_ignoring_warning(client, form, CUSTOMER_NO, customer, rng)
            .await?;
        let activity_code = self
            .set_ignoring_warning(client, form, ACTIVITY_CODE, activity_code, rng)
            .await?;

        transition(state, OrderState::HeaderCommitted);
        ensure_valid(client, form).await?;

        let line_count = rng.random_range(LINE_COUNT);
        let mut lines = Vec::with_capacity(line_count);
        for index in 0..line_count {
            transition(state, OrderState::LinesEntering(index));
            let row = client
                .repeater_rows(form)
                .await?
                .get(index)
                .cloned()
                .ok_or(ScenarioError::MissingLine { index })?;
            lines.push(self.enter_line(client, &row, rng).await?);
            self.delays.think_delay(rng).await;
        }

        transition(state, OrderState::LinesValidated);
        ensure_valid(client, form).await?;

        transition(state, OrderState::Posting);
        self.post(client, form).await?;
        transition(state, OrderState::PostResolved);

        Ok(SalesOrder {
            order_no,
            customer_no,
            activity_code,
            lines,
        })
    }

    async fn enter_line<R>(
        &self,
        client: &dyn UiSession,
        row: &FormHandle,
        rng: &mut R,
    ) -> Result<SalesLine, ScenarioError>
    where
        R: Rng + ?Sized,
    {
        client.activate(row, LINE_TYPE).await?;
        let line_type = self
            .set_ignoring_warning(client, row, LINE_TYPE, ITEM_LINE, rng)
            .await?;

        let item = select_random(client, self.pages.item_list, ITEM_KEY, rng).await?;
        let item_no = self
            .set_ignoring_warning(client, row, LINE_NO, &item, rng)
            .await?;

        let quantity = rng.random_range(QUANTITY_RANGE);
        let value = quantity.to_string();
        self.set_ignoring_warning(client, row, QUANTITY, &value, rng)
            .await?;
        set_and_expect_optional_dialog(
            client,
            row,
            QTY_TO_SHIP,
            &value,
            &[DialogKind::Warning, DialogKind::Message],
            &self.delays,
            rng,
        )
        .await?;

        let committed_quantity = client.get_value(row, QUANTITY).await?;
        let committed_to_ship = client.get_value(row, QTY_TO_SHIP).await?;
        if committed_quantity != value {
            return Err(ScenarioError::ValueMismatch {
                control: QUANTITY.to_string(),
                expected: value,
                actual: committed_quantity,
            });
        }
        if committed_to_ship != committed_quantity {
            return Err(ScenarioError::ValueMismatch {
                control: QTY_TO_SHIP.to_string(),
                expected: committed_quantity,
                actual: committed_to_ship,
            });
        }

        debug!(line = %row, item = %item_no, quantity, "Line entered");
        Ok(SalesLine {
            line_type,
            item_no,
            quantity,
            quantity_to_ship: quantity,
        })
    }

    async fn post(&self, client: &dyn UiSession, form: &FormHandle) -> Result<(), ScenarioError> {
        let post_span = TimingSpan::begin(POST_SPAN, self.transactions.clone());
        let interaction = client.invoke_action(form, POST).await?;
        post_span.end();

        let confirmation = match interaction {
            Interaction::Dialog(dialog) if dialog.kind == DialogKind::Confirmation => dialog,
            Interaction::None => {
                let errors = client.validate(form).await?;
                for error in &errors {
                    warn!("Validation error after post: {}", error);
                }
                return Err(ScenarioError::MissingExpectedDialog(
                    MISSING_POST_DIALOG.to_string(),
                ));
            }
            other => return Err(reject_interaction(client, other, POST).await),
        };

        let _confirm_span = TimingSpan::begin(CONFIRM_SPAN, self.transactions.clone());
        match dismiss_dialog(client, &confirmation, DialogKind::Confirmation.acknowledge_action())
            .await?
        {
            Interaction::None => Ok(()),
            Interaction::Dialog(prompt) if prompt.kind == DialogKind::Question => {
                debug!(message = %prompt.message, "Declining to open posted document");
                match dismiss_dialog(client, &prompt, "No").await? {
                    Interaction::None => Ok(()),
                    other => Err(reject_interaction(client, other, CONFIRM_SPAN).await),
                }
            }
            other => Err(reject_interaction(client, other, CONFIRM_SPAN).await),
        }
    }

    async fn set_ignoring_warning<R>(
        &self,
        client: &dyn UiSession,
        form: &FormHandle,
        control: &str,
        value: &str,
        rng: &mut R,
    ) -> Result<String, ScenarioError>
    where
        R: Rng + ?Sized,
    {
        set_and_expect_optional_dialog(
            client,
            form,
            control,
            value,
            &[DialogKind::Warning],
            &self.delays,
            rng,
        )
        .await
    }
}

#[async_trait]
impl Scenario for CreateAndPostSalesOrder {
    fn name(&self) -> &str {
        "CreateAndPostSalesOrder"
    }

    async fn execute(&self, ctx: &mut ScenarioContext) -> Result<(), ScenarioError> {
        self.create_and_post(ctx).await.map(|_| ())
    }
}

async fn ensure_valid(client: &dyn UiSession, form: &FormHandle) -> Result<(), ScenarioError> {
    let errors = client.validate(form).await?;
    if errors.is_empty() {
        return Ok(());
    }
    Err(ScenarioError::validation(form.caption.clone(), errors))
}

fn transition(state: &mut OrderState, next: OrderState) {
    debug!(from = ?state, to = ?next, "Order state");
    *state = next;
}
