//! In-memory session storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_core::{GatehouseResult, SessionRecord, SessionStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Session table held in process memory; lost on restart
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, record: SessionRecord) -> GatehouseResult<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(record.token.clone(), record);
        Ok(())
    }

    async fn get(&self, token: &str) -> GatehouseResult<Option<SessionRecord>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(token).cloned())
    }

    async fn touch(&self, token: &str, at: DateTime<Utc>) -> GatehouseResult<()> {
        let mut sessions = self.sessions.write().await;
        if let Some(record) = sessions.get_mut(token) {
            record.last_seen = at;
        }
        Ok(())
    }

    async fn remove(&self, token: &str) -> GatehouseResult<bool> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(token).is_some())
    }

    async fn remove_idle_since(&self, cutoff: DateTime<Utc>) -> GatehouseResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_idle_since(cutoff));
        let removed = (before - sessions.len()) as u64;
        if removed > 0 {
            debug!("Removed {} idle sessions", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use gatehouse_core::{Role, UserId};

    #[tokio::test]
    async fn test_insert_get_remove() {
        let store = MemorySessionStore::new();
        store
            .insert(SessionRecord::new("abc".into(), UserId(1), Role::User))
            .await
            .unwrap();

        let record = store.get("abc").await.unwrap().unwrap();
        assert_eq!(record.user_id, UserId(1));

        assert!(store.remove("abc").await.unwrap());
        assert!(!store.remove("abc").await.unwrap());
        assert!(store.get("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_idle_since() {
        let store = MemorySessionStore::new();
        let mut stale = SessionRecord::new("stale".into(), UserId(1), Role::User);
        stale.last_seen = Utc::now() - Duration::hours(2);
        store.insert(stale).await.unwrap();
        store
            .insert(SessionRecord::new("fresh".into(), UserId(2), Role::Admin))
            .await
            .unwrap();

        let removed = store
            .remove_idle_since(Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get("fresh").await.unwrap().is_some());
    }
}
