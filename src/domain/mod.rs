// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// - 领域模型（models）：身份、场景结果和销售订单快照
/// - 服务（services）：随机选取和操作员节奏
pub mod models;
pub mod services;
