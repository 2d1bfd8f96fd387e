// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::automation::traits::{
    ClientError, Dialog, DialogKind, FieldError, FormHandle, Interaction, PageId,
    SessionConnector, UiSession,
};
use crate::config::settings::PageSettings;
use crate::domain::models::{Identity, SalesLine, SalesOrder};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const LINE_TYPES: [&str; 6] = ["", "Item", "G/L Account", "Resource", "Fixed Asset", "Charge (Item)"];

/// 过账动作的模拟行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostBehavior {
    /// 弹出过账确认框，确认后可选地询问是否打开已过账单据
    Confirm { open_posted_prompt: bool },
    /// 不弹出任何对话框
    NoDialog,
    /// 弹出指定类型的对话框
    Dialog(DialogKind),
}

/// 模拟应用配置
///
/// 一个内存中的订单处理应用：客户、物料、活动代码主数据，以及
/// 信用警告、客户冻结、发货提示和过账对话框等行为开关。
#[derive(Debug, Clone)]
pub struct SimulatedApp {
    pub pages: PageSettings,
    pub customers: Vec<String>,
    pub items: Vec<String>,
    pub activity_codes: Vec<String>,
    /// 设置这些客户时弹出信用额度警告
    pub credit_warning_customers: HashSet<String>,
    /// 被冻结的客户，表单校验会报错
    pub blocked_customers: HashSet<String>,
    /// 设置这些物料的待发货数量时弹出提示消息
    pub shipment_notice_items: HashSet<String>,
    pub post_behavior: PostBehavior,
    /// 用户名 → 密码
    pub users: HashMap<String, String>,
    pub allow_platform_identity: bool,
    /// 列表页面一次渲染的行数
    pub viewport_size: usize,
    /// 新订单的空白行数
    pub line_rows: usize,
    /// 每次往返的模拟延迟
    pub latency: Duration,
    /// 覆盖 "Sales Order" 动作打开的页面编号
    pub new_order_page: Option<PageId>,
}

impl SimulatedApp {
    pub fn new(pages: PageSettings) -> Self {
        Self {
            pages,
            customers: Vec::new(),
            items: Vec::new(),
            activity_codes: Vec::new(),
            credit_warning_customers: HashSet::new(),
            blocked_customers: HashSet::new(),
            shipment_notice_items: HashSet::new(),
            post_behavior: PostBehavior::Confirm {
                open_posted_prompt: true,
            },
            users: HashMap::new(),
            allow_platform_identity: true,
            viewport_size: 50,
            line_rows: 10,
            latency: Duration::ZERO,
            new_order_page: None,
        }
    }

    /// 带有演示主数据的模拟应用
    pub fn demo(pages: PageSettings) -> Self {
        Self::new(pages)
            .with_customers(["10000", "20000", "30000", "40000", "50000"])
            .with_items(["1000", "1100", "1120", "1150", "1996", "70000"])
            .with_activity_codes(["SALES", "SERVICE", "PROMO"])
            .with_credit_warning("40000")
            .with_shipment_notice("70000")
    }

    pub fn with_customers<I, S>(mut self, customers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.customers = customers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_activity_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.activity_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_credit_warning(mut self, customer: impl Into<String>) -> Self {
        self.credit_warning_customers.insert(customer.into());
        self
    }

    pub fn with_blocked_customer(mut self, customer: impl Into<String>) -> Self {
        self.blocked_customers.insert(customer.into());
        self
    }

    pub fn with_shipment_notice(mut self, item: impl Into<String>) -> Self {
        self.shipment_notice_items.insert(item.into());
        self
    }

    pub fn with_post_behavior(mut self, behavior: PostBehavior) -> Self {
        self.post_behavior = behavior;
        self
    }

    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(username.into(), password.into());
        self
    }

    pub fn without_platform_identity(mut self) -> Self {
        self.allow_platform_identity = false;
        self
    }

    pub fn with_viewport_size(mut self, rows: usize) -> Self {
        self.viewport_size = rows;
        self
    }

    pub fn with_line_rows(mut self, rows: usize) -> Self {
        self.line_rows = rows;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_new_order_page(mut self, page: PageId) -> Self {
        self.new_order_page = Some(page);
        self
    }
}

/// 所有模拟会话共享的服务器状态
struct Backend {
    app: SimulatedApp,
    next_order_no: AtomicU64,
    posted: Mutex<Vec<SalesOrder>>,
    connects: AtomicUsize,
    closed_sessions: AtomicUsize,
}

/// 模拟会话连接器
#[derive(Clone)]
pub struct SimulatedConnector {
    backend: Arc<Backend>,
}

impl SimulatedConnector {
    pub fn new(app: SimulatedApp) -> Self {
        Self {
            backend: Arc::new(Backend {
                app,
                next_order_no: AtomicU64::new(1001),
                posted: Mutex::new(Vec::new()),
                connects: AtomicUsize::new(0),
                closed_sessions: AtomicUsize::new(0),
            }),
        }
    }

    /// 成功登录的次数
    pub fn connect_count(&self) -> usize {
        self.backend.connects.load(Ordering::SeqCst)
    }

    /// 已关闭的会话数
    pub fn closed_sessions(&self) -> usize {
        self.backend.closed_sessions.load(Ordering::SeqCst)
    }

    /// 已过账的订单
    pub fn posted_orders(&self) -> Vec<SalesOrder> {
        self.backend.posted.lock().clone()
    }
}

#[async_trait]
impl SessionConnector for SimulatedConnector {
    async fn connect(&self, identity: &Identity) -> Result<Arc<dyn UiSession>, ClientError> {
        pause(self.backend.app.latency).await;

        let user = match identity {
            Identity::Credentials { username, password } => {
                match self.backend.app.users.get(username) {
                    Some(expected) if expected == password => username.clone(),
                    _ => {
                        return Err(ClientError::Authentication(format!(
                            "invalid credentials for user {}",
                            username
                        )))
                    }
                }
            }
            Identity::Platform if self.backend.app.allow_platform_identity => {
                "PLATFORM".to_string()
            }
            Identity::Platform => {
                return Err(ClientError::Authentication(
                    "platform identity is not accepted".to_string(),
                ))
            }
        };

        self.backend.connects.fetch_add(1, Ordering::SeqCst);
        let role_center_page = self.backend.app.pages.role_center;
        let mut state = SessionState::default();
        let role_center = state.insert(
            "Order Processor Role Center",
            Some(role_center_page),
            HashMap::new(),
            FormKind::RoleCenter,
        );
        debug!(user = %user, "Simulated session opened");

        Ok(Arc::new(SimulatedSession {
            backend: self.backend.clone(),
            role_center,
            state: Mutex::new(state),
        }))
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

enum FormKind {
    RoleCenter,
    List { rows: Vec<u64> },
    ListRow,
    SalesOrder { lines: Vec<u64> },
    OrderLine,
    Dialog { effect: DialogEffect, actions: &'static [&'static str] },
    Document,
}

#[derive(Clone, Copy)]
enum Surface {
    RoleCenter,
    SalesOrder,
    Dialog(&'static [&'static str]),
    Other,
}

enum DialogEffect {
    CreditWarning { form: u64, control: String, previous: String },
    PostOptions { order: u64 },
    OpenPosted,
    Dismiss,
}

struct SimForm {
    handle: FormHandle,
    controls: HashMap<String, String>,
    kind: FormKind,
}

#[derive(Default)]
struct SessionState {
    closed: bool,
    next_id: u64,
    forms: HashMap<u64, SimForm>,
}

impl SessionState {
    fn insert(
        &mut self,
        caption: &str,
        page_id: Option<PageId>,
        controls: HashMap<String, String>,
        kind: FormKind,
    ) -> FormHandle {
        self.next_id += 1;
        let handle = FormHandle {
            id: self.next_id,
            caption: caption.to_string(),
            page_id,
        };
        self.forms.insert(
            handle.id,
            SimForm {
                handle: handle.clone(),
                controls,
                kind,
            },
        );
        handle
    }

    fn form(&self, handle: &FormHandle) -> Result<&SimForm, ClientError> {
        self.forms
            .get(&handle.id)
            .ok_or_else(|| ClientError::FormNotFound(handle.to_string()))
    }

    fn form_mut(&mut self, handle: &FormHandle) -> Result<&mut SimForm, ClientError> {
        self.forms
            .get_mut(&handle.id)
            .ok_or_else(|| ClientError::FormNotFound(handle.to_string()))
    }

    fn dialog(
        &mut self,
        kind: DialogKind,
        message: impl Into<String>,
        effect: DialogEffect,
        actions: &'static [&'static str],
    ) -> Interaction {
        let caption = match kind {
            DialogKind::Warning => "Warning",
            DialogKind::Message => "Message",
            DialogKind::Confirmation => "Confirm",
            DialogKind::Question => "Question",
            DialogKind::Error => "Error",
        };
        let form = self.insert(caption, None, HashMap::new(), FormKind::Dialog { effect, actions });
        Interaction::Dialog(Dialog {
            form,
            kind,
            message: message.into(),
        })
    }

    fn error_dialog(&mut self, message: impl Into<String>) -> Interaction {
        self.dialog(DialogKind::Error, message, DialogEffect::Dismiss, &["OK"])
    }

    fn list(&mut self, caption: &str, page: PageId, records: Vec<HashMap<String, String>>) -> FormHandle {
        let handle = self.insert(caption, Some(page), HashMap::new(), FormKind::List { rows: Vec::new() });
        let rows: Vec<u64> = records
            .into_iter()
            .enumerate()
            .map(|(index, values)| {
                self.insert(&format!("{} row {}", caption, index + 1), None, values, FormKind::ListRow)
                    .id
            })
            .collect();
        if let Some(form) = self.forms.get_mut(&handle.id) {
            form.kind = FormKind::List { rows };
        }
        handle
    }

    fn new_sales_order(&mut self, page: PageId, line_rows: usize) -> FormHandle {
        let header = controls(&[("No.", ""), ("Customer No.", ""), ("Activity Code", ""), ("Status", "Open")]);
        let handle = self.insert("Sales Order", Some(page), header, FormKind::SalesOrder { lines: Vec::new() });
        let lines: Vec<u64> = (0..line_rows)
            .map(|index| {
                let values = controls(&[("Type", ""), ("No.", ""), ("Quantity", ""), ("Qty. to Ship", "")]);
                self.insert(
                    &format!("Sales Order line {}", index + 1),
                    None,
                    values,
                    FormKind::OrderLine,
                )
                .id
            })
            .collect();
        if let Some(form) = self.forms.get_mut(&handle.id) {
            form.kind = FormKind::SalesOrder { lines };
        }
        handle
    }

    fn remove(&mut self, id: u64) {
        if let Some(form) = self.forms.remove(&id) {
            let children = match form.kind {
                FormKind::List { rows } => rows,
                FormKind::SalesOrder { lines } => lines,
                _ => Vec::new(),
            };
            for child in children {
                self.forms.remove(&child);
            }
        }
    }

    fn snapshot_order(&self, order: u64) -> Option<SalesOrder> {
        let form = self.forms.get(&order)?;
        let FormKind::SalesOrder { lines } = &form.kind else {
            return None;
        };
        let value = |form: &SimForm, control: &str| form.controls.get(control).cloned().unwrap_or_default();
        let lines = lines
            .iter()
            .filter_map(|id| self.forms.get(id))
            .filter(|line| !value(*line, "No.").is_empty())
            .map(|line| SalesLine {
                line_type: value(line, "Type"),
                item_no: value(line, "No."),
                quantity: value(line, "Quantity").parse().unwrap_or(0),
                quantity_to_ship: value(line, "Qty. to Ship").parse().unwrap_or(0),
            })
            .collect();
        Some(SalesOrder {
            order_no: value(form, "No."),
            customer_no: value(form, "Customer No."),
            activity_code: value(form, "Activity Code"),
            lines,
        })
    }
}

fn controls(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

async fn pause(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

/// 模拟 UI 会话
pub struct SimulatedSession {
    backend: Arc<Backend>,
    role_center: FormHandle,
    state: Mutex<SessionState>,
}

impl SimulatedSession {
    async fn round_trip<T>(
        &self,
        f: impl FnOnce(&mut SessionState, &Backend) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        pause(self.backend.app.latency).await;
        let mut state = self.state.lock();
        if state.closed {
            return Err(ClientError::SessionClosed);
        }
        f(&mut state, &self.backend)
    }

    fn open_list(&self, state: &mut SessionState, page: PageId) -> Result<FormHandle, ClientError> {
        let app = &self.backend.app;
        let pages = &app.pages;
        let viewport = app.viewport_size;
        let rows = |keys: &[String], key: &str, label: &str| -> Vec<HashMap<String, String>> {
            keys.iter()
                .take(viewport)
                .map(|k| {
                    let text = format!("{} {}", label, k);
                    controls(&[(key, k.as_str()), (label, text.as_str())])
                })
                .collect()
        };

        let handle = if page == pages.customer_list {
            state.list("Customers", page, rows(&app.customers, "No.", "Name"))
        } else if page == pages.item_list {
            state.list("Items", page, rows(&app.items, "No.", "Description"))
        } else if page == pages.activity_code_list {
            state.list("Activity Codes", page, rows(&app.activity_codes, "Code", "Description"))
        } else if page == pages.sales_order_list {
            let orders: Vec<String> = self
                .backend
                .posted
                .lock()
                .iter()
                .map(|order| order.order_no.clone())
                .collect();
            state.list("Sales Orders", page, rows(&orders, "No.", "Customer"))
        } else if page == pages.sales_order {
            state.new_sales_order(page, app.line_rows)
        } else {
            return Err(ClientError::FormNotFound(format!("page {}", page)));
        };
        Ok(handle)
    }
}

#[async_trait]
impl UiSession for SimulatedSession {
    fn role_center(&self) -> FormHandle {
        self.role_center.clone()
    }

    async fn open_page(&self, page: PageId) -> Result<FormHandle, ClientError> {
        self.round_trip(|state, _| self.open_list(state, page)).await
    }

    async fn invoke_action(
        &self,
        form: &FormHandle,
        action: &str,
    ) -> Result<Interaction, ClientError> {
        self.round_trip(|state, backend| {
            let not_found = || ClientError::ActionNotFound {
                form: form.caption.clone(),
                action: action.to_string(),
            };
            let app = &backend.app;

            let surface = match &state.form(form)?.kind {
                FormKind::RoleCenter => Surface::RoleCenter,
                FormKind::SalesOrder { .. } => Surface::SalesOrder,
                FormKind::Dialog { actions, .. } => Surface::Dialog(*actions),
                _ => Surface::Other,
            };

            match surface {
                Surface::RoleCenter if action == "Sales Order" => {
                    let page = app.new_order_page.unwrap_or(app.pages.sales_order);
                    Ok(Interaction::NewForm(state.new_sales_order(page, app.line_rows)))
                }
                Surface::SalesOrder if action == "Post..." => match app.post_behavior {
                    PostBehavior::NoDialog => Ok(Interaction::None),
                    PostBehavior::Confirm { .. } => Ok(state.dialog(
                        DialogKind::Confirmation,
                        "Ship and invoice the order?",
                        DialogEffect::PostOptions { order: form.id },
                        &["OK", "Cancel"],
                    )),
                    PostBehavior::Dialog(kind) => Ok(state.dialog(
                        kind,
                        "Posting interrupted",
                        DialogEffect::Dismiss,
                        &["OK", "Yes", "No"],
                    )),
                },
                Surface::Dialog(actions) => {
                    if !actions.contains(&action) {
                        return Err(not_found());
                    }
                    let Some(SimForm {
                        kind: FormKind::Dialog { effect, .. },
                        ..
                    }) = state.forms.remove(&form.id)
                    else {
                        return Err(not_found());
                    };
                    match effect {
                        DialogEffect::CreditWarning {
                            form: target,
                            control,
                            previous,
                        } => {
                            if action == "No" {
                                if let Some(target) = state.forms.get_mut(&target) {
                                    target.controls.insert(control, previous);
                                }
                            }
                            Ok(Interaction::None)
                        }
                        DialogEffect::PostOptions { order } if action == "OK" => {
                            let Some(posted) = state.snapshot_order(order) else {
                                return Err(ClientError::FormNotFound(format!("order #{}", order)));
                            };
                            if let Some(order_form) = state.forms.get_mut(&order) {
                                order_form.controls.insert("Status".to_string(), "Posted".to_string());
                            }
                            let posted_no = posted.order_no.clone();
                            backend.posted.lock().push(posted);
                            match app.post_behavior {
                                PostBehavior::Confirm {
                                    open_posted_prompt: true,
                                } => Ok(state.dialog(
                                    DialogKind::Question,
                                    format!(
                                        "Order {} has been posted and moved to Posted Sales Invoices. Do you want to open the posted invoice?",
                                        posted_no
                                    ),
                                    DialogEffect::OpenPosted,
                                    &["Yes", "No"],
                                )),
                                _ => Ok(Interaction::None),
                            }
                        }
                        DialogEffect::OpenPosted if action == "Yes" => Ok(Interaction::NewForm(
                            state.insert("Posted Sales Invoice", None, HashMap::new(), FormKind::Document),
                        )),
                        _ => Ok(Interaction::None),
                    }
                }
                _ => Err(not_found()),
            }
        })
        .await
    }

    async fn activate(&self, form: &FormHandle, control: &str) -> Result<(), ClientError> {
        self.round_trip(|state, backend| {
            let target = state.form_mut(form)?;
            if !target.controls.contains_key(control) {
                return Err(ClientError::ControlNotFound {
                    form: form.caption.clone(),
                    control: control.to_string(),
                });
            }
            // Leaving the number field creates the header record.
            if matches!(target.kind, FormKind::SalesOrder { .. })
                && control != "No."
                && target.controls.get("No.").is_some_and(|no| no.is_empty())
            {
                let number = backend.next_order_no.fetch_add(1, Ordering::SeqCst);
                target.controls.insert("No.".to_string(), format!("S-ORD{:06}", number));
            }
            Ok(())
        })
        .await
    }

    async fn get_value(&self, form: &FormHandle, control: &str) -> Result<String, ClientError> {
        self.round_trip(|state, _| {
            state
                .form(form)?
                .controls
                .get(control)
                .cloned()
                .ok_or_else(|| ClientError::ControlNotFound {
                    form: form.caption.clone(),
                    control: control.to_string(),
                })
        })
        .await
    }

    async fn set_value(
        &self,
        form: &FormHandle,
        control: &str,
        value: &str,
    ) -> Result<Interaction, ClientError> {
        self.round_trip(|state, backend| {
            let app = &backend.app;
            let target = state.form(form)?;
            let Some(previous) = target.controls.get(control).cloned() else {
                return Err(ClientError::ControlNotFound {
                    form: form.caption.clone(),
                    control: control.to_string(),
                });
            };
            let is_order = matches!(target.kind, FormKind::SalesOrder { .. });
            let is_line = matches!(target.kind, FormKind::OrderLine);
            let line_value = |name: &str| target.controls.get(name).cloned().unwrap_or_default();
            let line_type = line_value("Type");
            let line_item = line_value("No.");
            let line_quantity: u32 = line_value("Quantity").parse().unwrap_or(0);

            let mut follow_up = Interaction::None;
            let mut updates = vec![(control.to_string(), value.to_string())];

            match (is_order, is_line, control) {
                (true, _, "Customer No.") => {
                    if !app.customers.iter().any(|c| c == value) {
                        return Ok(state.error_dialog(format!(
                            "The Customer does not exist. Identification fields and values: No.='{}'",
                            value
                        )));
                    }
                    if app.credit_warning_customers.contains(value) {
                        follow_up = state.dialog(
                            DialogKind::Warning,
                            format!("The customer's credit limit has been exceeded for {}. Do you still want to record the amount?", value),
                            DialogEffect::CreditWarning {
                                form: form.id,
                                control: control.to_string(),
                                previous,
                            },
                            &["Yes", "No"],
                        );
                    }
                }
                (true, _, "Activity Code") => {
                    if !app.activity_codes.iter().any(|c| c == value) {
                        return Ok(state.error_dialog(format!(
                            "The Activity Code does not exist. Identification fields and values: Code='{}'",
                            value
                        )));
                    }
                }
                (_, true, "Type") => {
                    if !LINE_TYPES.contains(&value) {
                        return Ok(state.error_dialog(format!("'{}' is not a valid line type", value)));
                    }
                }
                (_, true, "No.") => {
                    if line_type.is_empty() {
                        return Ok(state.error_dialog("Type must have a value in Sales Line"));
                    }
                    if line_type == "Item" && !app.items.iter().any(|i| i == value) {
                        return Ok(state.error_dialog(format!(
                            "The Item does not exist. Identification fields and values: No.='{}'",
                            value
                        )));
                    }
                }
                (_, true, "Quantity") => {
                    if value.parse::<u32>().is_err() {
                        return Ok(state.error_dialog(format!("'{}' is not a valid quantity", value)));
                    }
                    updates.push(("Qty. to Ship".to_string(), value.to_string()));
                }
                (_, true, "Qty. to Ship") => {
                    let Ok(to_ship) = value.parse::<u32>() else {
                        return Ok(state.error_dialog(format!("'{}' is not a valid quantity", value)));
                    };
                    if to_ship > line_quantity {
                        return Ok(state.error_dialog(format!(
                            "You cannot ship more than {} units.",
                            line_quantity
                        )));
                    }
                    if app.shipment_notice_items.contains(&line_item) {
                        follow_up = state.dialog(
                            DialogKind::Message,
                            format!("Item {} is shipped from a different location.", line_item),
                            DialogEffect::Dismiss,
                            &["OK"],
                        );
                    }
                }
                _ => {}
            }

            let target = state.form_mut(form)?;
            target.controls.extend(updates);
            Ok(follow_up)
        })
        .await
    }

    async fn repeater_rows(&self, form: &FormHandle) -> Result<Vec<FormHandle>, ClientError> {
        self.round_trip(|state, backend| {
            let ids = match &state.form(form)?.kind {
                FormKind::List { rows } => rows.clone(),
                FormKind::SalesOrder { lines } => lines.clone(),
                _ => Vec::new(),
            };
            Ok(ids
                .iter()
                .take(backend.app.viewport_size)
                .filter_map(|id| state.forms.get(id))
                .map(|row| row.handle.clone())
                .collect())
        })
        .await
    }

    async fn validate(&self, form: &FormHandle) -> Result<Vec<FieldError>, ClientError> {
        self.round_trip(|state, backend| {
            let target = state.form(form)?;
            let FormKind::SalesOrder { lines } = &target.kind else {
                return Ok(Vec::new());
            };
            let error = |control: &str, message: String| FieldError {
                control: control.to_string(),
                message,
            };
            let value = |form: &SimForm, control: &str| form.controls.get(control).cloned().unwrap_or_default();

            let mut errors = Vec::new();
            let customer = value(target, "Customer No.");
            if customer.is_empty() {
                errors.push(error("Customer No.", "Customer No. must have a value".to_string()));
            } else if backend.app.blocked_customers.contains(&customer) {
                errors.push(error("Customer No.", format!("Customer {} is blocked", customer)));
            }
            if value(target, "Activity Code").is_empty() {
                errors.push(error("Activity Code", "Activity Code must have a value".to_string()));
            }
            for line in lines.iter().filter_map(|id| state.forms.get(id)) {
                if !value(line, "No.").is_empty() && value(line, "Quantity").is_empty() {
                    errors.push(error(
                        "Quantity",
                        format!("Quantity must have a value in {}", line.handle.caption),
                    ));
                }
            }
            Ok(errors)
        })
        .await
    }

    async fn close_form(&self, form: &FormHandle) -> Result<(), ClientError> {
        self.round_trip(|state, _| {
            if matches!(state.form(form)?.kind, FormKind::RoleCenter) {
                return Ok(());
            }
            state.remove(form.id);
            Ok(())
        })
        .await
    }

    fn open_forms(&self) -> Vec<FormHandle> {
        let state = self.state.lock();
        let mut forms: Vec<FormHandle> = state
            .forms
            .values()
            .filter(|form| {
                matches!(
                    form.kind,
                    FormKind::List { .. }
                        | FormKind::SalesOrder { .. }
                        | FormKind::Dialog { .. }
                        | FormKind::Document
                )
            })
            .map(|form| form.handle.clone())
            .collect();
        forms.sort_by_key(|form| form.id);
        forms
    }

    async fn close(&self) -> Result<(), ClientError> {
        pause(self.backend.app.latency).await;
        let mut state = self.state.lock();
        if state.closed {
            return Err(ClientError::SessionClosed);
        }
        state.closed = true;
        state.forms.clear();
        self.backend.closed_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> SimulatedApp {
        SimulatedApp::demo(PageSettings::default()).with_user("ORDERPROC", "secret")
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_password() {
        let connector = SimulatedConnector::new(app());
        let result = connector
            .connect(&Identity::credentials("ORDERPROC", "wrong"))
            .await;
        assert!(matches!(result, Err(ClientError::Authentication(_))));
        assert_eq!(connector.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_customer_activation_assigns_order_number() {
        let connector = SimulatedConnector::new(app());
        let session = connector.connect(&Identity::Platform).await.unwrap();
        let Interaction::NewForm(order) = session
            .invoke_action(&session.role_center(), "Sales Order")
            .await
            .unwrap()
        else {
            panic!("expected a new sales order form");
        };

        session.activate(&order, "No.").await.unwrap();
        assert_eq!(session.get_value(&order, "No.").await.unwrap(), "");

        session.activate(&order, "Customer No.").await.unwrap();
        assert_eq!(session.get_value(&order, "No.").await.unwrap(), "S-ORD001001");
    }

    #[tokio::test]
    async fn test_item_requires_line_type() {
        let connector = SimulatedConnector::new(app());
        let session = connector.connect(&Identity::Platform).await.unwrap();
        let order = session.open_page(42).await.unwrap();
        let line = session.repeater_rows(&order).await.unwrap()[0].clone();

        let interaction = session.set_value(&line, "No.", "1000").await.unwrap();
        let Interaction::Dialog(dialog) = interaction else {
            panic!("expected an error dialog");
        };
        assert_eq!(dialog.kind, DialogKind::Error);
        assert_eq!(session.get_value(&line, "No.").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_closed_session_rejects_calls() {
        let connector = SimulatedConnector::new(app());
        let session = connector.connect(&Identity::Platform).await.unwrap();
        session.close().await.unwrap();

        assert!(matches!(session.open_page(22).await, Err(ClientError::SessionClosed)));
        assert!(matches!(session.close().await, Err(ClientError::SessionClosed)));
        assert_eq!(connector.closed_sessions(), 1);
    }
}
