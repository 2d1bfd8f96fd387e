// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;

/// 场景执行结果
///
/// 每次场景调用恰好产生其中之一，并上报给压测框架。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    /// 通过
    Pass,
    /// 失败，附带失败信息
    Fail(String),
    /// 无法判定，附带原因
    Inconclusive(String),
}

impl ScenarioOutcome {
    /// 指标标签使用的结果名称
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioOutcome::Pass => "pass",
            ScenarioOutcome::Fail(_) => "fail",
            ScenarioOutcome::Inconclusive(_) => "inconclusive",
        }
    }
}

impl fmt::Display for ScenarioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioOutcome::Pass => write!(f, "pass"),
            ScenarioOutcome::Fail(message) => write!(f, "fail: {}", message),
            ScenarioOutcome::Inconclusive(reason) => write!(f, "inconclusive: {}", reason),
        }
    }
}
