// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 会话注册表、场景执行器和各个压测场景
pub mod scenario_runner;
pub mod scenarios;
pub mod session_registry;
