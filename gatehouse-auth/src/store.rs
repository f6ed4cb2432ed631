//! In-memory credential store

use async_trait::async_trait;
use gatehouse_core::{duplicate_error, CredentialStore, GatehouseResult, NewUser, User, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Accounts {
    next_id: i64,
    by_id: HashMap<UserId, User>,
}

/// Account table held in process memory; ids start at 1
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    accounts: Arc<RwLock<Accounts>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> GatehouseResult<Option<User>> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .by_id
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> GatehouseResult<Option<User>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.by_id.get(&id).cloned())
    }

    async fn insert(&self, user: NewUser) -> GatehouseResult<User> {
        // Check and insert under one write lock so concurrent inserts of the
        // same username cannot both succeed.
        let mut accounts = self.accounts.write().await;
        if accounts.by_id.values().any(|u| u.username == user.username) {
            return Err(duplicate_error!(
                format!("username '{}' already exists", user.username),
                "memory_credential_store"
            ));
        }

        accounts.next_id += 1;
        let stored = User {
            id: UserId(accounts.next_id),
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
        };
        accounts.by_id.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn count(&self) -> GatehouseResult<u64> {
        Ok(self.accounts.read().await.by_id.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::Role;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            password_hash: "digest".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryCredentialStore::new();
        let alice = store.insert(new_user("alice")).await.unwrap();
        let bob = store.insert(new_user("bob")).await.unwrap();

        assert_eq!(alice.id, UserId(1));
        assert_eq!(bob.id, UserId(2));
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(
            store.find_by_username("bob").await.unwrap().map(|u| u.id),
            Some(bob.id)
        );
        assert!(store.find_by_id(UserId(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = MemoryCredentialStore::new();
        store.insert(new_user("alice")).await.unwrap();

        let err = store.insert(new_user("alice")).await.unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_usernames_are_case_sensitive() {
        let store = MemoryCredentialStore::new();
        store.insert(new_user("alice")).await.unwrap();

        assert!(store.username_exists("alice").await.unwrap());
        assert!(!store.username_exists("Alice").await.unwrap());
        store.insert(new_user("Alice")).await.unwrap();
    }
}
