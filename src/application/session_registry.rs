// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::automation::{ClientError, FormHandle, SessionConnector, UiSession};
use crate::domain::models::Identity;
use crate::utils::errors::ScenarioError;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// 已登录的会话
///
/// 同一身份的所有虚拟用户共享一个会话，会话在整个运行期间存活。
pub struct Session {
    identity: Identity,
    client: Arc<dyn UiSession>,
    closed: AtomicBool,
}

impl Session {
    pub fn new(identity: Identity, client: Arc<dyn UiSession>) -> Self {
        Self {
            identity,
            client,
            closed: AtomicBool::new(false),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn client(&self) -> &dyn UiSession {
        self.client.as_ref()
    }

    /// 会话当前打开的表单
    pub fn open_forms(&self) -> Vec<FormHandle> {
        self.client.open_forms()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// 关闭会话
    ///
    /// 只有第一次调用会真正关闭客户端，之后返回 `Ok(false)`
    pub async fn close(&self) -> Result<bool, ClientError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        self.client.close().await?;
        Ok(true)
    }
}

/// 关闭时等待进行中登录的最长时间
const CONNECT_GRACE: Duration = Duration::from_secs(5);

type SessionSlot = Arc<OnceCell<Arc<Session>>>;

/// 会话注册表
///
/// 按身份懒加载并缓存会话。同一身份的并发请求共享一次登录。
pub struct SessionRegistry {
    connector: Arc<dyn SessionConnector>,
    sessions: DashMap<String, SessionSlot>,
}

impl SessionRegistry {
    pub fn new(connector: Arc<dyn SessionConnector>) -> Self {
        Self {
            connector,
            sessions: DashMap::new(),
        }
    }

    /// 获取身份对应的会话，不存在时登录并创建
    ///
    /// 登录失败返回 `ScenarioError::Authentication`，注册表本身不重试
    pub async fn acquire(&self, identity: &Identity) -> Result<Arc<Session>, ScenarioError> {
        let slot = self.slot(identity);

        let session = slot
            .get_or_try_init(|| async {
                info!(
                    identity = %identity,
                    connector = self.connector.name(),
                    "Opening session"
                );
                let client = self.connector.connect(identity).await.map_err(|e| {
                    ScenarioError::Authentication {
                        identity: identity.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok::<_, ScenarioError>(Arc::new(Session::new(identity.clone(), client)))
            })
            .await?;

        // 缓存键不含密码，已有会话时仍要核对凭据
        if session.identity() != identity {
            warn!(identity = %identity, "Credentials do not match the cached session");
            return Err(ScenarioError::Authentication {
                identity: identity.to_string(),
                reason: "credentials do not match the established session".to_string(),
            });
        }

        Ok(session.clone())
    }

    fn slot(&self, identity: &Identity) -> SessionSlot {
        self.sessions
            .entry(identity.key())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// 关闭所有已缓存的会话
    ///
    /// 每个会话只关闭一次，关闭错误只记录日志。仍在登录中的会话最多等待
    /// `CONNECT_GRACE`，超时的槽位留在注册表中。返回本次实际关闭的会话数。
    pub async fn close_all(&self) -> usize {
        let slots: Vec<(String, SessionSlot)> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let mut closed = 0;

        for (key, slot) in slots {
            let session = match slot.get() {
                Some(session) => session.clone(),
                None => {
                    // 登录失败或被中止的槽位会立即得到 Err
                    let pending = slot.get_or_try_init(|| async { Err::<Arc<Session>, ()>(()) });
                    match timeout(CONNECT_GRACE, pending).await {
                        Ok(Ok(session)) => session.clone(),
                        Ok(Err(())) => {
                            self.sessions.remove(&key);
                            continue;
                        }
                        Err(_) => {
                            warn!(session = %key, "Session still connecting at teardown, left open");
                            continue;
                        }
                    }
                }
            };
            self.sessions.remove(&key);

            let abandoned = session.open_forms();
            if !abandoned.is_empty() {
                debug!(
                    session = %key,
                    forms = abandoned.len(),
                    "Closing session with open forms"
                );
            }

            match session.close().await {
                Ok(true) => {
                    closed += 1;
                    info!(session = %key, "Session closed");
                }
                Ok(false) => {}
                Err(e) => warn!(session = %key, "Failed to close session: {}", e),
            }
        }

        closed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::simulated::{SimulatedApp, SimulatedConnector};
    use crate::config::settings::PageSettings;

    fn connector() -> SimulatedConnector {
        let app = SimulatedApp::demo(PageSettings::default())
            .with_user("ORDERPROC", "secret")
            .with_user("SALESREP", "secret")
            .with_latency(Duration::from_millis(20));
        SimulatedConnector::new(app)
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquire_shares_one_session() {
        let connector = connector();
        let registry = Arc::new(SessionRegistry::new(Arc::new(connector.clone())));
        let identity = Identity::credentials("ORDERPROC", "secret");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                let identity = identity.clone();
                tokio::spawn(async move { registry.acquire(&identity).await })
            })
            .collect();

        let mut sessions = Vec::new();
        for handle in handles {
            sessions.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(connector.connect_count(), 1);
        assert_eq!(registry.len(), 1);
        assert!(sessions.iter().all(|s| Arc::ptr_eq(s, &sessions[0])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_authentication_failure_is_reported() {
        let registry = SessionRegistry::new(Arc::new(connector()));

        let result = registry
            .acquire(&Identity::credentials("ORDERPROC", "wrong"))
            .await;

        assert!(matches!(result, Err(ScenarioError::Authentication { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_all_closes_each_session_once() {
        let connector = connector();
        let registry = SessionRegistry::new(Arc::new(connector.clone()));

        let first = registry
            .acquire(&Identity::credentials("ORDERPROC", "secret"))
            .await
            .unwrap();
        registry
            .acquire(&Identity::credentials("SALESREP", "secret"))
            .await
            .unwrap();

        // An abandoned workflow leaves a page open.
        first.client().open_page(22).await.unwrap();

        assert_eq!(registry.close_all().await, 2);
        assert_eq!(registry.close_all().await, 0);
        assert_eq!(connector.closed_sessions(), 2);
        assert!(first.is_closed());
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_password_does_not_reuse_cached_session() {
        let connector = connector();
        let registry = SessionRegistry::new(Arc::new(connector.clone()));

        registry
            .acquire(&Identity::credentials("ORDERPROC", "secret"))
            .await
            .unwrap();
        let result = registry
            .acquire(&Identity::credentials("ORDERPROC", "wrong"))
            .await;

        assert!(matches!(result, Err(ScenarioError::Authentication { .. })));
        assert_eq!(connector.connect_count(), 1);
        assert!(registry
            .acquire(&Identity::credentials("ORDERPROC", "secret"))
            .await
            .is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_platform_identity() {
        let app = SimulatedApp::demo(PageSettings::default()).without_platform_identity();
        let connector = SimulatedConnector::new(app);
        let registry = SessionRegistry::new(Arc::new(connector.clone()));

        let result = registry.acquire(&Identity::Platform).await;

        assert!(matches!(result, Err(ScenarioError::Authentication { .. })));
        assert_eq!(connector.connect_count(), 0);
        assert_eq!(registry.close_all().await, 0);
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_all_waits_for_login_in_progress() {
        let connector = connector();
        let registry = Arc::new(SessionRegistry::new(Arc::new(connector.clone())));

        let login = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .acquire(&Identity::credentials("ORDERPROC", "secret"))
                    .await
            })
        };
        // Let the login start and park on the connect latency.
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.close_all().await, 1);
        assert_eq!(connector.closed_sessions(), 1);
        assert!(registry.is_empty());
        assert!(login.await.unwrap().unwrap().is_closed());
    }
}
