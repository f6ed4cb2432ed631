//! Core trait definitions
//!
//! Storage contracts implemented by the in-memory stores in `gatehouse-auth`
//! and the SQLite stores in `gatehouse-web`.

use crate::error::GatehouseResult;
use crate::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Relational table of accounts
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an account by its exact username
    async fn find_by_username(&self, username: &str) -> GatehouseResult<Option<User>>;

    /// Look up an account by id
    async fn find_by_id(&self, id: UserId) -> GatehouseResult<Option<User>>;

    /// Whether an account with this username exists
    async fn username_exists(&self, username: &str) -> GatehouseResult<bool> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    /// Insert a new account.
    ///
    /// Fails with [`crate::GatehouseError::Duplicate`] when the username is taken.
    async fn insert(&self, user: NewUser) -> GatehouseResult<User>;

    /// Number of stored accounts
    async fn count(&self) -> GatehouseResult<u64>;
}

/// Server-side session table
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, record: SessionRecord) -> GatehouseResult<()>;

    async fn get(&self, token: &str) -> GatehouseResult<Option<SessionRecord>>;

    /// Refresh `last_seen` for a live session
    async fn touch(&self, token: &str, at: DateTime<Utc>) -> GatehouseResult<()>;

    /// Remove a session; returns whether one existed
    async fn remove(&self, token: &str) -> GatehouseResult<bool>;

    /// Remove every session idle since before `cutoff`; returns how many went
    async fn remove_idle_since(&self, cutoff: DateTime<Utc>) -> GatehouseResult<u64>;
}
