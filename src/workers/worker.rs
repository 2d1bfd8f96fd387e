// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::WorkerError;
use async_trait::async_trait;

/// Worker trait定义
///
/// 由负载管理器启动的工作器，运行结束时返回已完成的迭代次数
#[async_trait]
pub trait Worker: Send + Sync {
    /// 运行工作器直到迭代用完或会话关闭
    async fn run(&self) -> Result<u64, WorkerError>;

    /// 获取工作器名称
    fn name(&self) -> &str;
}
