// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 虚拟用户及其生命周期管理
pub mod manager;
pub mod virtual_user;
pub mod worker;

pub use worker::Worker;
