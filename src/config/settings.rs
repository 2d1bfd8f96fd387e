// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::scenarios::ScenarioKind;
use crate::automation::PageId;
use crate::domain::models::Identity;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// 应用程序配置设置
///
/// 包含服务连接、页面编号、负载、节奏延迟和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务连接配置
    pub service: ServiceSettings,
    /// 页面编号配置
    pub pages: PageSettings,
    /// 负载配置
    pub load: LoadSettings,
    /// 思考/录入延迟配置
    pub delays: DelaySettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 服务连接配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSettings {
    /// 客户端服务地址，`sim://` 表示使用内置模拟后端
    pub endpoint: String,
    /// 是否使用当前平台用户登录
    pub use_platform_identity: bool,
    /// 用户名/密码凭据列表，虚拟用户按顺序轮流使用
    #[serde(default)]
    pub users: Vec<UserCredentials>,
}

/// 用户凭据
#[derive(Clone, Deserialize)]
pub struct UserCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// 页面编号配置设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageSettings {
    /// 订单处理员角色中心
    pub role_center: PageId,
    /// 客户列表
    pub customer_list: PageId,
    /// 物料列表
    pub item_list: PageId,
    /// 销售订单列表
    pub sales_order_list: PageId,
    /// 销售订单卡片
    pub sales_order: PageId,
    /// 活动代码列表
    pub activity_code_list: PageId,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            role_center: 9006,
            customer_list: 22,
            item_list: 31,
            sales_order_list: 9305,
            sales_order: 42,
            activity_code_list: 12124,
        }
    }
}

/// 负载配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoadSettings {
    /// 并发虚拟用户数
    pub virtual_users: usize,
    /// 每个虚拟用户的迭代次数，不设置则一直运行到时长结束
    pub iterations: Option<u64>,
    /// 运行时长（秒）
    pub duration_secs: Option<u64>,
    /// 随机种子，设置后每次运行可复现
    pub seed: Option<u64>,
    /// 要运行的场景
    pub scenario: ScenarioKind,
}

/// 延迟配置设置（毫秒）
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DelaySettings {
    /// 每行录入后的思考时间下限
    pub think_min_ms: u64,
    /// 每行录入后的思考时间上限
    pub think_max_ms: u64,
    /// 每次字段录入前的延迟下限
    pub entry_min_ms: u64,
    /// 每次字段录入前的延迟上限
    pub entry_max_ms: u64,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启动 Prometheus 导出器
    pub enabled: bool,
    /// 导出器监听地址
    pub listen_address: String,
}

/// 按加载顺序列出配置文件（不含扩展名）
///
/// 未设置环境名或环境名为 `default` 时只有 `default` 一个文件
pub(crate) fn config_files(dir: &Path, env: Option<&str>) -> Vec<PathBuf> {
    let mut files = vec![dir.join("default")];
    if let Some(env) = env.filter(|env| !env.is_empty() && *env != "default") {
        files.push(dir.join(env));
    }
    files
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从 `config/` 目录和环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_dir("config")
    }

    /// 从指定目录加载配置
    ///
    /// 加载顺序：内置默认值 → `default` → `{APP_ENVIRONMENT}` → `NAVLOAD__*` 环境变量
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let files = config_files(dir, std::env::var("APP_ENVIRONMENT").ok().as_deref());

        let pages = PageSettings::default();
        let mut builder = Config::builder()
            // Service
            .set_default("service.endpoint", "sim://local")?
            .set_default("service.use_platform_identity", false)?
            // Page ids of the order processor role
            .set_default("pages.role_center", i64::from(pages.role_center))?
            .set_default("pages.customer_list", i64::from(pages.customer_list))?
            .set_default("pages.item_list", i64::from(pages.item_list))?
            .set_default("pages.sales_order_list", i64::from(pages.sales_order_list))?
            .set_default("pages.sales_order", i64::from(pages.sales_order))?
            .set_default("pages.activity_code_list", i64::from(pages.activity_code_list))?
            // Load
            .set_default("load.virtual_users", 1)?
            .set_default("load.scenario", "create_and_post_sales_order")?
            // Delays
            .set_default("delays.think_min_ms", 800)?
            .set_default("delays.think_max_ms", 1200)?
            .set_default("delays.entry_min_ms", 100)?
            .set_default("delays.entry_max_ms", 300)?
            // Metrics
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_address", "0.0.0.0:9000")?;

        for file in files {
            builder = builder.add_source(File::with_name(&file.to_string_lossy()).required(false));
        }

        builder
            .add_source(Environment::with_prefix("NAVLOAD").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 虚拟用户可用的登录身份
    ///
    /// 启用平台身份时只有一个身份，否则为配置的全部用户凭据
    pub fn identities(&self) -> Vec<Identity> {
        if self.service.use_platform_identity {
            return vec![Identity::Platform];
        }
        self.service
            .users
            .iter()
            .map(|user| Identity::credentials(&user.username, &user.password))
            .collect()
    }
}
