// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// - 随机选取（random_selector）：从列表视口中随机选取记录键
/// - 延迟节奏（delay_timing）：思考时间和录入延迟
pub mod delay_timing;
pub mod random_selector;
