// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::automation::{ClientError, DialogKind, FieldError, PageId};
use thiserror::Error;

/// 场景错误类型
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("登录失败 ({identity}): {reason}")]
    Authentication { identity: String, reason: String },

    #[error("页面 {page} 的列 '{column}' 没有可选记录")]
    EmptySelection { page: PageId, column: String },

    #[error("表单 '{form}' 校验失败: {summary}")]
    Validation {
        form: String,
        errors: Vec<FieldError>,
        summary: String,
    },

    #[error("{context}: 意外的界面 '{caption}' ({kind:?})")]
    UnexpectedDialog {
        context: String,
        kind: Option<DialogKind>,
        caption: String,
    },

    #[error("{0}")]
    MissingExpectedDialog(String),

    #[error("动作 '{action}' 没有打开新表单")]
    MissingForm { action: String },

    #[error("订单行 {index} 不在视口中")]
    MissingLine { index: usize },

    #[error("期望页面 {expected}，实际打开 '{caption}' ({actual:?})")]
    WrongPage {
        expected: PageId,
        actual: Option<PageId>,
        caption: String,
    },

    #[error("控件 '{control}' 的值不一致: 期望 '{expected}'，实际 '{actual}'")]
    ValueMismatch {
        control: String,
        expected: String,
        actual: String,
    },

    #[error("{0}")]
    Failed(String),

    #[error("交互错误: {0}")]
    Interaction(#[from] ClientError),
}

impl ScenarioError {
    /// 构造校验错误，摘要由全部字段错误拼接而成
    pub fn validation(form: impl Into<String>, errors: Vec<FieldError>) -> Self {
        let summary = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        ScenarioError::Validation {
            form: form.into(),
            errors,
            summary,
        }
    }

    /// 是否应判为不确定结果而非失败
    pub fn is_inconclusive(&self) -> bool {
        matches!(self, ScenarioError::MissingExpectedDialog(_))
    }

    /// 错误类别，用作日志字段
    pub fn kind(&self) -> &'static str {
        match self {
            ScenarioError::Authentication { .. } => "authentication",
            ScenarioError::EmptySelection { .. } => "empty_selection",
            ScenarioError::Validation { .. } => "validation",
            ScenarioError::UnexpectedDialog { .. } => "unexpected_dialog",
            ScenarioError::MissingExpectedDialog(_) => "missing_expected_dialog",
            ScenarioError::MissingForm { .. } => "missing_form",
            ScenarioError::MissingLine { .. } => "missing_line",
            ScenarioError::WrongPage { .. } => "wrong_page",
            ScenarioError::ValueMismatch { .. } => "value_mismatch",
            ScenarioError::Failed(_) => "failed",
            ScenarioError::Interaction(_) => "interaction",
        }
    }
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("会话错误: {0}")]
    SessionError(String),

    #[error("场景错误: {0}")]
    ScenarioError(#[from] ScenarioError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_missing_dialog_is_inconclusive() {
        let missing = ScenarioError::MissingExpectedDialog("Post dialog can't be found".into());
        assert!(missing.is_inconclusive());
        assert_eq!(missing.to_string(), "Post dialog can't be found");

        let closed = ScenarioError::from(ClientError::SessionClosed);
        assert!(!closed.is_inconclusive());
        assert_eq!(closed.kind(), "interaction");
    }

    #[test]
    fn test_validation_summary_joins_field_errors() {
        let error = ScenarioError::validation(
            "Sales Order",
            vec![
                FieldError {
                    control: "Customer No.".into(),
                    message: "Customer 30000 is blocked".into(),
                },
                FieldError {
                    control: "Activity Code".into(),
                    message: "Activity Code must have a value".into(),
                },
            ],
        );
        let ScenarioError::Validation { summary, errors, .. } = &error else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(
            summary,
            "Customer No.: Customer 30000 is blocked; Activity Code: Activity Code must have a value"
        );
    }
}
