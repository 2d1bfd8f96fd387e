// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了压测场景使用的核心数据结构，包括：
/// - 登录身份（identity）：虚拟用户连接服务器时使用的凭据
/// - 场景结果（outcome）：一次场景调用的通过/失败/无法判定结果
/// - 销售订单（sales_order）：工作流创建的订单快照
pub mod identity;
pub mod outcome;
pub mod sales_order;

pub use identity::Identity;
pub use outcome::ScenarioOutcome;
pub use sales_order::{SalesLine, SalesOrder};
