//! In-memory session holding the master key
//!
//! The master key lives here and nowhere else for the duration of a login.
//! It is dropped (and zeroized) on logout, on inactivity timeout, and when a
//! newer session replaces it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::crypto::MasterKey;
use crate::error::{Result, VaultError};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Logout,
    Inactivity,
}

/// Public view of the active session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Session ID for logging
    pub session_id: Uuid,
    pub user_id: String,
    pub username: String,
    /// Time since the last recorded activity
    pub idle: Duration,
}

struct ActiveSession {
    session_id: Uuid,
    user_id: String,
    username: String,
    master_key: MasterKey,
    last_active: Instant,
}

impl ActiveSession {
    fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_active) > timeout
    }
}

/// Owner of the logged-in master key
pub struct SessionManager {
    state: RwLock<Option<ActiveSession>>,
    timeout: Duration,
}

impl SessionManager {
    /// Create a session manager that ends sessions after `timeout` without activity
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: RwLock::new(None),
            timeout,
        }
    }

    /// Begin a session, replacing any existing one
    pub async fn start(&self, user_id: &str, username: &str, master_key: MasterKey) -> Uuid {
        let session_id = Uuid::new_v4();
        let mut state = self.state.write().await;

        if let Some(previous) = state.replace(ActiveSession {
            session_id,
            user_id: user_id.to_string(),
            username: username.to_string(),
            master_key,
            last_active: Instant::now(),
        }) {
            debug!("Session {} replaced by {}", previous.session_id, session_id);
        }

        info!("Session {} started for {}", session_id, username);
        session_id
    }

    /// End the session and drop the master key. Returns false if none was active.
    pub async fn end(&self, reason: SessionEnd) -> bool {
        let ended = self.state.write().await.take();

        match ended {
            Some(session) => {
                info!("Session {} ended ({:?})", session.session_id, reason);
                true
            }
            None => false,
        }
    }

    /// Reset the inactivity clock. Returns false if no session is active.
    pub async fn record_activity(&self) -> bool {
        let mut state = self.state.write().await;

        match state.as_mut() {
            Some(session) if !session.is_idle(Instant::now(), self.timeout) => {
                session.last_active = Instant::now();
                true
            }
            _ => false,
        }
    }

    /// Whether a session is active and has not exceeded the idle threshold
    pub async fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .await
            .as_ref()
            .is_some_and(|s| !s.is_idle(Instant::now(), self.timeout))
    }

    /// Snapshot of the current session, if any
    pub async fn current(&self) -> Option<SessionInfo> {
        let now = Instant::now();
        self.state.read().await.as_ref().map(|s| SessionInfo {
            session_id: s.session_id,
            user_id: s.user_id.clone(),
            username: s.username.clone(),
            idle: now.saturating_duration_since(s.last_active),
        })
    }

    /// End the session if it has been idle longer than the threshold
    pub async fn expire_if_idle(&self) -> bool {
        let mut state = self.state.write().await;

        let expired = state
            .as_ref()
            .is_some_and(|s| s.is_idle(Instant::now(), self.timeout));

        if expired {
            if let Some(session) = state.take() {
                info!(
                    "Session {} ended ({:?})",
                    session.session_id,
                    SessionEnd::Inactivity
                );
            }
        }
        expired
    }

    /// A copy of the master key for one operation
    ///
    /// Fails with [`VaultError::VaultLocked`] when logged out or idle past the
    /// threshold; an idle session is ended here even if no monitor runs.
    pub async fn master_key(&self) -> Result<MasterKey> {
        self.expire_if_idle().await;

        self.state
            .read()
            .await
            .as_ref()
            .map(|s| s.master_key.clone())
            .ok_or(VaultError::VaultLocked)
    }

    /// Owner identity and master key, read together from the same session
    pub async fn credentials(&self) -> Result<(String, MasterKey)> {
        self.expire_if_idle().await;

        self.state
            .read()
            .await
            .as_ref()
            .map(|s| (s.user_id.clone(), s.master_key.clone()))
            .ok_or(VaultError::VaultLocked)
    }

    /// Owner identity of the active session
    pub async fn user_id(&self) -> Result<String> {
        self.expire_if_idle().await;

        self.state
            .read()
            .await
            .as_ref()
            .map(|s| s.user_id.clone())
            .ok_or(VaultError::VaultLocked)
    }

    /// Periodically end session `watched` once it goes idle
    ///
    /// The task stops as soon as that session is gone, whether by timeout,
    /// logout, or replacement.
    pub fn spawn_inactivity_monitor(
        self: &Arc<Self>,
        watched: Uuid,
        check_interval: Duration,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if !manager.check_watched(watched).await {
                    debug!("Inactivity monitor for session {} stopping", watched);
                    break;
                }
            }
        })
    }

    /// One monitor step. Returns false once `watched` is no longer the live session.
    async fn check_watched(&self, watched: Uuid) -> bool {
        let mut state = self.state.write().await;

        match state.as_ref() {
            Some(session) if session.session_id == watched => {
                if session.is_idle(Instant::now(), self.timeout) {
                    state.take();
                    info!("Session {} ended ({:?})", watched, SessionEnd::Inactivity);
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> Arc<SessionManager> {
        Arc::new(SessionManager::new(Duration::from_secs(30)))
    }

    #[tokio::test]
    async fn test_start_and_end() {
        let manager = manager();
        assert!(!manager.is_authenticated().await);
        assert!(matches!(manager.master_key().await, Err(VaultError::VaultLocked)));

        manager
            .start("uid-1", "alice", MasterKey::from("correct-master-key"))
            .await;
        assert!(manager.is_authenticated().await);
        assert_eq!(manager.master_key().await.unwrap().expose(), "correct-master-key");
        assert_eq!(manager.user_id().await.unwrap(), "uid-1");

        assert!(manager.end(SessionEnd::Logout).await);
        assert!(!manager.is_authenticated().await);
        assert!(matches!(manager.user_id().await, Err(VaultError::VaultLocked)));
        assert!(!manager.end(SessionEnd::Logout).await);
    }

    #[tokio::test]
    async fn test_credentials_come_from_one_session() {
        let manager = manager();
        assert!(matches!(manager.credentials().await, Err(VaultError::VaultLocked)));

        manager.start("uid-1", "alice", MasterKey::from("alice-key")).await;
        let (user_id, key) = manager.credentials().await.unwrap();
        assert_eq!((user_id.as_str(), key.expose()), ("uid-1", "alice-key"));

        manager.start("uid-2", "bob", MasterKey::from("bob-key")).await;
        let (user_id, key) = manager.credentials().await.unwrap();
        assert_eq!((user_id.as_str(), key.expose()), ("uid-2", "bob-key"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_credentials_expire_when_idle() {
        let manager = manager();
        manager.start("uid-1", "alice", MasterKey::from("k")).await;

        tokio::time::advance(Duration::from_secs(31)).await;

        assert!(matches!(manager.credentials().await, Err(VaultError::VaultLocked)));
        assert!(manager.current().await.is_none());
    }

    #[tokio::test]
    async fn test_record_activity_without_session() {
        let manager = manager();
        assert!(!manager.record_activity().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_times_out() {
        let manager = manager();
        let session_id = manager.start("uid-1", "alice", MasterKey::from("k")).await;
        let monitor = manager.spawn_inactivity_monitor(session_id, Duration::from_secs(1));

        tokio::time::sleep(Duration::from_secs(31)).await;

        tokio::time::timeout(Duration::from_secs(5), monitor)
            .await
            .expect("monitor should stop after timeout")
            .unwrap();
        assert!(manager.current().await.is_none());
        assert!(!manager.is_authenticated().await);
        assert!(matches!(manager.master_key().await, Err(VaultError::VaultLocked)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_resets_clock() {
        let manager = manager();
        let session_id = manager.start("uid-1", "alice", MasterKey::from("k")).await;
        let monitor = manager.spawn_inactivity_monitor(session_id, Duration::from_secs(1));

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(manager.record_activity().await);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(manager.is_authenticated().await);
        assert!(manager.current().await.is_some());
        assert!(!monitor.is_finished());

        // 31s after the last activity
        tokio::time::sleep(Duration::from_secs(29)).await;
        tokio::time::timeout(Duration::from_secs(5), monitor)
            .await
            .expect("monitor should stop after timeout")
            .unwrap();
        assert!(!manager.is_authenticated().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_master_key_expires_without_monitor() {
        let manager = manager();
        manager.start("uid-1", "alice", MasterKey::from("k")).await;

        tokio::time::advance(Duration::from_secs(31)).await;

        assert!(!manager.is_authenticated().await);
        assert!(!manager.record_activity().await);
        assert!(matches!(manager.master_key().await, Err(VaultError::VaultLocked)));
        assert!(manager.current().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_stops_on_logout() {
        let manager = manager();
        let session_id = manager.start("uid-1", "alice", MasterKey::from("k")).await;
        let monitor = manager.spawn_inactivity_monitor(session_id, Duration::from_secs(1));

        tokio::time::sleep(Duration::from_secs(3)).await;
        manager.end(SessionEnd::Logout).await;

        tokio::time::timeout(Duration::from_secs(5), monitor)
            .await
            .expect("monitor should stop after logout")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_ignores_replacement_session() {
        let manager = manager();
        let session_id = manager.start("uid-1", "alice", MasterKey::from("k")).await;
        let monitor = manager.spawn_inactivity_monitor(session_id, Duration::from_secs(1));

        manager.start("uid-2", "bob", MasterKey::from("k2")).await;

        tokio::time::timeout(Duration::from_secs(5), monitor)
            .await
            .expect("old monitor should stop")
            .unwrap();
        assert_eq!(manager.user_id().await.unwrap(), "uid-2");
    }
}
