// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::automation::{Dialog, DialogKind, FormHandle, Interaction, UiSession};
use crate::domain::services::delay_timing::DelayTiming;
use crate::utils::errors::ScenarioError;
use rand::Rng;
use tracing::{debug, warn};

/// 写入控件值并容忍预期类型的对话框
///
/// 录入前先按录入延迟暂停。写入后如果弹出 `expected` 中某一类对话框，
/// 调用该类对话框的确认动作；其他对话框或新表单视为意外界面（先尽力关闭）。
/// 返回从控件读回的提交值。
pub async fn set_and_expect_optional_dialog<R>(
    session: &dyn UiSession,
    form: &FormHandle,
    control: &str,
    value: &str,
    expected: &[DialogKind],
    delays: &DelayTiming,
    rng: &mut R,
) -> Result<String, ScenarioError>
where
    R: Rng + ?Sized,
{
    delays.entry_delay(rng).await;

    match session.set_value(form, control, value).await? {
        Interaction::None => {}
        Interaction::Dialog(dialog) if expected.contains(&dialog.kind) => {
            debug!(
                control,
                kind = ?dialog.kind,
                message = %dialog.message,
                "Acknowledging dialog"
            );
            let context = format!("Acknowledging dialog after setting '{}'", control);
            let action = dialog.kind.acknowledge_action();
            match dismiss_dialog(session, &dialog, action).await? {
                Interaction::None => {}
                other => return Err(reject_interaction(session, other, &context).await),
            }
        }
        other => {
            let context = format!("Setting '{}'", control);
            return Err(reject_interaction(session, other, &context).await);
        }
    }

    Ok(session.get_value(form, control).await?)
}

/// 调用对话框上的动作
pub async fn dismiss_dialog(
    session: &dyn UiSession,
    dialog: &Dialog,
    action: &str,
) -> Result<Interaction, ScenarioError> {
    Ok(session.invoke_action(&dialog.form, action).await?)
}

/// 把意外出现的界面转换为错误
///
/// 对话框和新表单会先被尽力关闭；没有任何界面时返回 `MissingForm`
pub async fn reject_interaction(
    session: &dyn UiSession,
    interaction: Interaction,
    context: &str,
) -> ScenarioError {
    match interaction {
        Interaction::Dialog(dialog) => {
            warn!(
                kind = ?dialog.kind,
                message = %dialog.message,
                "{}: unexpected dialog",
                context
            );
            close_quietly(session, &dialog.form).await;
            ScenarioError::UnexpectedDialog {
                context: context.to_string(),
                kind: Some(dialog.kind),
                caption: dialog.form.caption,
            }
        }
        Interaction::NewForm(form) => {
            close_quietly(session, &form).await;
            ScenarioError::UnexpectedDialog {
                context: context.to_string(),
                kind: None,
                caption: form.caption,
            }
        }
        Interaction::None => ScenarioError::MissingForm {
            action: context.to_string(),
        },
    }
}

/// 关闭表单，失败只记录日志
pub async fn close_quietly(session: &dyn UiSession, form: &FormHandle) {
    if let Err(e) = session.close_form(form).await {
        warn!("Failed to close {}: {}", form, e);
    }
}
