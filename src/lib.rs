// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 会话注册表、场景执行器和压测场景
pub mod application;

/// UI 自动化模块
///
/// 客户端会话抽象和内存模拟后端
pub mod automation;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心数据结构和领域服务
pub mod domain;

/// 基础设施模块
///
/// 指标导出和计时事务
pub mod infrastructure;

/// 工具模块
///
/// 提供错误类型和日志初始化
pub mod utils;

/// 工作器模块
///
/// 虚拟用户和负载管理
pub mod workers;
