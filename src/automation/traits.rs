// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::Identity;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// 页面（表单）编号
pub type PageId = u32;

/// UI 自动化客户端错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// 身份验证失败
    #[error("Authentication failed: {0}")]
    Authentication(String),
    /// 表单不存在或已关闭
    #[error("Form not found: {0}")]
    FormNotFound(String),
    /// 控件不存在
    #[error("Control '{control}' not found on form '{form}'")]
    ControlNotFound { form: String, control: String },
    /// 动作不存在
    #[error("Action '{action}' not found on form '{form}'")]
    ActionNotFound { form: String, action: String },
    /// 会话已关闭
    #[error("Session closed")]
    SessionClosed,
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 传输层错误
    #[error("Transport error: {0}")]
    Transport(String),
}

/// 表单句柄
///
/// 指向服务器端一个逻辑表单（页面、对话框或重复器中的一行）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormHandle {
    /// 会话内唯一的表单编号
    pub id: u64,
    /// 表单标题
    pub caption: String,
    /// 对应的页面编号，行表单和对话框没有页面编号
    pub page_id: Option<PageId>,
}

impl fmt::Display for FormHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.caption, self.id)
    }
}

/// 对话框类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKind {
    /// 警告（例如信用额度超限），确认后保留输入值
    Warning,
    /// 普通消息
    Message,
    /// 操作确认（例如过账选项）
    Confirmation,
    /// 是/否提问
    Question,
    /// 错误
    Error,
}

impl DialogKind {
    /// 确认该类对话框时调用的动作
    pub fn acknowledge_action(self) -> &'static str {
        match self {
            DialogKind::Warning | DialogKind::Question => "Yes",
            DialogKind::Message | DialogKind::Confirmation | DialogKind::Error => "OK",
        }
    }
}

/// 对话框
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    /// 对话框所在的表单
    pub form: FormHandle,
    /// 对话框类型
    pub kind: DialogKind,
    /// 对话框正文
    pub message: String,
}

/// 一次交互产生的新界面
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// 没有新界面
    None,
    /// 打开了新表单
    NewForm(FormHandle),
    /// 弹出了对话框
    Dialog(Dialog),
}

/// 表单校验错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// 出错的控件
    pub control: String,
    /// 错误信息
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.control, self.message)
    }
}

/// UI 会话特质
///
/// 一个已登录的客户端会话。每个调用都是到应用服务器的一次往返，
/// 调用方按顺序等待每一步完成。
#[async_trait]
pub trait UiSession: Send + Sync {
    /// 登录后打开的角色中心
    fn role_center(&self) -> FormHandle;

    /// 打开页面
    async fn open_page(&self, page: PageId) -> Result<FormHandle, ClientError>;

    /// 调用表单上的动作
    async fn invoke_action(
        &self,
        form: &FormHandle,
        action: &str,
    ) -> Result<Interaction, ClientError>;

    /// 激活（聚焦）控件，服务器可能因此产生副作用
    async fn activate(&self, form: &FormHandle, control: &str) -> Result<(), ClientError>;

    /// 读取控件值
    async fn get_value(&self, form: &FormHandle, control: &str) -> Result<String, ClientError>;

    /// 写入控件值
    async fn set_value(
        &self,
        form: &FormHandle,
        control: &str,
        value: &str,
    ) -> Result<Interaction, ClientError>;

    /// 重复器当前渲染的行（视口），不一定是全部数据
    async fn repeater_rows(&self, form: &FormHandle) -> Result<Vec<FormHandle>, ClientError>;

    /// 校验整个表单，返回空列表表示通过
    async fn validate(&self, form: &FormHandle) -> Result<Vec<FieldError>, ClientError>;

    /// 关闭表单
    async fn close_form(&self, form: &FormHandle) -> Result<(), ClientError>;

    /// 当前打开的页面和对话框（不含角色中心）
    fn open_forms(&self) -> Vec<FormHandle>;

    /// 关闭会话
    async fn close(&self) -> Result<(), ClientError>;
}

/// 会话连接器特质
#[async_trait]
pub trait SessionConnector: Send + Sync {
    /// 以指定身份登录并创建会话
    async fn connect(&self, identity: &Identity) -> Result<Arc<dyn UiSession>, ClientError>;

    /// 连接器名称
    fn name(&self) -> &'static str;
}
