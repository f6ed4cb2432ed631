//! Session Manager - token to identity resolution
//!
//! Resolves the session token presented with a request into an
//! [`IdentityContext`], and creates or destroys sessions on login and logout.

use super::{SessionPolicy, SessionToken};
use crate::identity::IdentityContext;
use chrono::Utc;
use gatehouse_core::{CredentialStore, GatehouseResult, Role, SessionRecord, SessionStore, UserId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Server-side session lifecycle
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionStore>,
    credentials: Arc<dyn CredentialStore>,
    policy: SessionPolicy,
}

impl SessionManager {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        credentials: Arc<dyn CredentialStore>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            sessions,
            credentials,
            policy,
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Resolve the identity behind a token.
    ///
    /// Missing, unknown, idle or orphaned sessions resolve as anonymous. A
    /// storage failure also resolves as anonymous after being logged.
    pub async fn resolve(&self, token: Option<&str>) -> IdentityContext {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return IdentityContext::Anonymous;
        };

        match self.try_resolve(token).await {
            Ok(identity) => identity,
            Err(e) => {
                e.log();
                IdentityContext::Anonymous
            }
        }
    }

    async fn try_resolve(&self, token: &str) -> GatehouseResult<IdentityContext> {
        let Some(record) = self.sessions.get(token).await? else {
            debug!("Unknown session token presented");
            return Ok(IdentityContext::Anonymous);
        };

        let now = Utc::now();
        if let Some(cutoff) = self.policy.idle_cutoff(now) {
            if record.is_idle_since(cutoff) {
                debug!(user_id = %record.user_id, "Session expired after idle timeout");
                self.sessions.remove(token).await?;
                return Ok(IdentityContext::Anonymous);
            }
        }

        let Some(user) = self.credentials.find_by_id(record.user_id).await? else {
            warn!(user_id = %record.user_id, "Session refers to a user that no longer exists");
            self.sessions.remove(token).await?;
            return Ok(IdentityContext::Anonymous);
        };

        if self.policy.idle_timeout.is_some() {
            self.sessions.touch(token, now).await?;
        }

        Ok(IdentityContext::for_user(&user))
    }

    /// Start a session for `user_id`, discarding the one this client held before
    pub async fn create(
        &self,
        previous: Option<&str>,
        user_id: UserId,
        role: Role,
    ) -> GatehouseResult<SessionToken> {
        if let Some(previous) = previous.filter(|t| !t.is_empty()) {
            self.sessions.remove(previous).await?;
        }

        let token = SessionToken::generate();
        self.sessions
            .insert(SessionRecord::new(token.as_str().to_string(), user_id, role))
            .await?;

        info!(user_id = %user_id, role = %role, "Session created");
        Ok(token)
    }

    /// End a session; unknown tokens are ignored
    pub async fn destroy(&self, token: &str) -> GatehouseResult<()> {
        if self.sessions.remove(token).await? {
            info!("Session destroyed");
        }
        Ok(())
    }

    /// Drop every session past the idle timeout; no-op without a timeout
    pub async fn purge_expired(&self) -> GatehouseResult<u64> {
        let Some(cutoff) = self.policy.idle_cutoff(Utc::now()) else {
            return Ok(0);
        };

        let removed = self.sessions.remove_idle_since(cutoff).await?;
        if removed > 0 {
            info!("Purged {} idle sessions", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use crate::store::MemoryCredentialStore;
    use chrono::Duration;
    use gatehouse_core::NewUser;

    async fn setup(policy: SessionPolicy) -> (SessionManager, MemorySessionStore, MemoryCredentialStore) {
        let sessions = MemorySessionStore::new();
        let credentials = MemoryCredentialStore::new();
        let manager = SessionManager::new(
            Arc::new(sessions.clone()),
            Arc::new(credentials.clone()),
            policy,
        );
        (manager, sessions, credentials)
    }

    async fn add_user(store: &MemoryCredentialStore, name: &str, role: Role) -> UserId {
        store
            .insert(NewUser {
                username: name.to_string(),
                password_hash: "x".to_string(),
                role,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_missing_or_unknown_token_is_anonymous() {
        let (manager, _, _) = setup(SessionPolicy::never_expire()).await;
        assert!(manager.resolve(None).await.is_anonymous());
        assert!(manager.resolve(Some("")).await.is_anonymous());
        assert!(manager.resolve(Some("bogus")).await.is_anonymous());
    }

    #[tokio::test]
    async fn test_create_resolve_destroy() {
        let (manager, _, credentials) = setup(SessionPolicy::never_expire()).await;
        let id = add_user(&credentials, "alice", Role::User).await;

        let token = manager.create(None, id, Role::User).await.unwrap();
        let identity = manager.resolve(Some(token.as_str())).await;
        assert_eq!(identity.user_id(), Some(id));
        assert_eq!(identity.role(), Some(Role::User));

        manager.destroy(token.as_str()).await.unwrap();
        assert!(manager.resolve(Some(token.as_str())).await.is_anonymous());

        // Destroying twice is harmless
        manager.destroy(token.as_str()).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_invalidates_previous_token() {
        let (manager, sessions, credentials) = setup(SessionPolicy::never_expire()).await;
        let id = add_user(&credentials, "alice", Role::Admin).await;

        let first = manager.create(None, id, Role::Admin).await.unwrap();
        let second = manager
            .create(Some(first.as_str()), id, Role::Admin)
            .await
            .unwrap();

        assert!(manager.resolve(Some(first.as_str())).await.is_anonymous());
        assert!(manager.resolve(Some(second.as_str())).await.is_admin());
        assert_eq!(sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_orphaned_session_is_anonymous_and_pruned() {
        let (manager, sessions, _) = setup(SessionPolicy::never_expire()).await;

        let token = manager.create(None, UserId(999), Role::Admin).await.unwrap();
        assert!(manager.resolve(Some(token.as_str())).await.is_anonymous());
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let (manager, sessions, credentials) =
            setup(SessionPolicy::idle_timeout_secs(60)).await;
        let id = add_user(&credentials, "alice", Role::User).await;

        let mut stale = SessionRecord::new("stale".into(), id, Role::User);
        stale.last_seen = Utc::now() - Duration::minutes(5);
        sessions.insert(stale).await.unwrap();

        assert!(manager.resolve(Some("stale")).await.is_anonymous());
        assert!(sessions.get("stale").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (manager, sessions, credentials) =
            setup(SessionPolicy::idle_timeout_secs(60)).await;
        let id = add_user(&credentials, "alice", Role::User).await;

        let live = manager.create(None, id, Role::User).await.unwrap();
        let mut stale = SessionRecord::new("stale".into(), id, Role::User);
        stale.last_seen = Utc::now() - Duration::minutes(5);
        sessions.insert(stale).await.unwrap();

        assert_eq!(manager.purge_expired().await.unwrap(), 1);
        assert!(manager.resolve(Some(live.as_str())).await.is_authenticated());
    }

    #[tokio::test]
    async fn test_purge_without_timeout_is_noop() {
        let (manager, sessions, _) = setup(SessionPolicy::never_expire()).await;
        let mut old = SessionRecord::new("old".into(), UserId(1), Role::User);
        old.last_seen = Utc::now() - Duration::days(365);
        sessions.insert(old).await.unwrap();

        assert_eq!(manager.purge_expired().await.unwrap(), 0);
        assert_eq!(sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_out_of_range_timeout_keeps_sessions_alive() {
        for secs in [u64::MAX, 10_000_000_000_000] {
            let (manager, sessions, credentials) =
                setup(SessionPolicy::idle_timeout_secs(secs)).await;
            let id = add_user(&credentials, "alice", Role::User).await;

            let token = manager.create(None, id, Role::User).await.unwrap();
            let mut old = SessionRecord::new("old".into(), id, Role::User);
            old.last_seen = Utc::now() - Duration::days(365);
            sessions.insert(old).await.unwrap();

            assert!(manager.resolve(Some(token.as_str())).await.is_authenticated());
            assert!(manager.resolve(Some("old")).await.is_authenticated());
            assert_eq!(manager.purge_expired().await.unwrap(), 0);
            assert_eq!(sessions.len().await, 2);
        }
    }
}
