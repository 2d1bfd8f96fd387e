// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::automation::{FormHandle, PageId, UiSession};
use crate::utils::errors::ScenarioError;
use rand::Rng;
use tracing::{debug, warn};

/// 从列表页面的当前视口中随机选取一条记录的键
///
/// 打开列表页面，在当前已渲染的行中均匀随机选一行，读取 `key_column`
/// 的值，然后关闭列表页面（出错时同样关闭）。视口为空或键为空时返回
/// `EmptySelection`。
pub async fn select_random<R>(
    session: &dyn UiSession,
    page: PageId,
    key_column: &str,
    rng: &mut R,
) -> Result<String, ScenarioError>
where
    R: Rng + ?Sized,
{
    let list = session.open_page(page).await?;
    let picked = pick_key(session, &list, page, key_column, rng).await;

    if let Err(e) = session.close_form(&list).await {
        warn!("Failed to close list page {}: {}", list, e);
    }

    picked
}

async fn pick_key<R>(
    session: &dyn UiSession,
    list: &FormHandle,
    page: PageId,
    key_column: &str,
    rng: &mut R,
) -> Result<String, ScenarioError>
where
    R: Rng + ?Sized,
{
    let empty = || ScenarioError::EmptySelection {
        page,
        column: key_column.to_string(),
    };

    let rows = session.repeater_rows(list).await?;
    if rows.is_empty() {
        return Err(empty());
    }

    let row = &rows[rng.random_range(0..rows.len())];
    let key = session.get_value(row, key_column).await?;
    if key.trim().is_empty() {
        return Err(empty());
    }

    debug!(page, column = key_column, key = %key, "Selected random record");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::simulated::{SimulatedApp, SimulatedConnector};
    use crate::automation::SessionConnector;
    use crate::config::settings::PageSettings;
    use crate::domain::models::Identity;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::sync::Arc;

    async fn session_with_customers(customers: &[&str]) -> Arc<dyn UiSession> {
        let app = SimulatedApp::new(PageSettings::default()).with_customers(customers.iter().copied());
        connect(app).await
    }

    async fn connect(app: SimulatedApp) -> Arc<dyn UiSession> {
        SimulatedConnector::new(app)
            .connect(&Identity::Platform)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_list_raises_empty_selection() {
        let session = session_with_customers(&[]).await;
        let mut rng = StdRng::seed_from_u64(7);

        let result = select_random(session.as_ref(), 22, "No.", &mut rng).await;

        assert!(matches!(
            result,
            Err(ScenarioError::EmptySelection { page: 22, .. })
        ));
        assert!(session.open_forms().is_empty());
    }

    #[tokio::test]
    async fn test_single_row_is_always_selected() {
        let session = session_with_customers(&["10000"]).await;
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let key = select_random(session.as_ref(), 22, "No.", &mut rng)
                .await
                .unwrap();
            assert_eq!(key, "10000");
        }
    }

    #[tokio::test]
    async fn test_two_rows_are_both_drawn() {
        let session = session_with_customers(&["10000", "20000"]).await;
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();

        for _ in 0..1000 {
            let key = select_random(session.as_ref(), 22, "No.", &mut rng)
                .await
                .unwrap();
            assert!(key == "10000" || key == "20000");
            seen.insert(key);
        }

        assert_eq!(seen.len(), 2);
        assert!(session.open_forms().is_empty());
    }

    #[tokio::test]
    async fn test_missing_column_closes_list() {
        let session = session_with_customers(&["10000"]).await;
        let mut rng = StdRng::seed_from_u64(1);

        let result = select_random(session.as_ref(), 22, "Code", &mut rng).await;

        assert!(matches!(result, Err(ScenarioError::Interaction(_))));
        assert!(session.open_forms().is_empty());
    }

    #[tokio::test]
    async fn test_only_rendered_rows_are_drawn() {
        let app = SimulatedApp::new(PageSettings::default())
            .with_customers(["10000", "20000", "30000", "40000", "50000"])
            .with_viewport_size(2);
        let session = connect(app).await;
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = HashSet::new();

        for _ in 0..200 {
            seen.insert(
                select_random(session.as_ref(), 22, "No.", &mut rng)
                    .await
                    .unwrap(),
            );
        }

        let expected: HashSet<String> = ["10000", "20000"].iter().map(|s| s.to_string()).collect();
        assert_eq!(seen, expected);
    }
}
