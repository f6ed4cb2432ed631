//! Application state shared by every handler

use crate::{
    database::{self, SqliteCredentialStore, SqliteSessionStore},
    WebResult,
};
use gatehouse_auth::{AccountService, AuthServices, SessionManager, SessionPolicy};
use gatehouse_core::{CredentialStore, GatehouseConfig, SessionStore};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<GatehouseConfig>,
    /// Login and provisioning
    pub accounts: AccountService,
    /// Token to identity resolution
    pub sessions: SessionManager,
}

impl AppState {
    /// State backed by the SQLite database named in `config.database`
    pub async fn new(config: GatehouseConfig) -> WebResult<Self> {
        let pool = database::connect(&config.database).await?;
        database::init_schema(&pool).await?;

        let credentials = Arc::new(SqliteCredentialStore::new(pool.clone()));
        let sessions = Arc::new(SqliteSessionStore::new(pool));

        let state = Self::from_stores(config, credentials, sessions);
        info!("Application state initialized successfully");
        Ok(state)
    }

    /// State backed by process memory; nothing survives a restart
    pub fn in_memory(config: GatehouseConfig) -> Self {
        let policy = SessionPolicy::from(&config.session);
        Self::from_services(config, AuthServices::in_memory(policy))
    }

    pub fn from_stores(
        config: GatehouseConfig,
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let policy = SessionPolicy::from(&config.session);
        Self::from_services(config, AuthServices::new(credentials, sessions, policy))
    }

    fn from_services(config: GatehouseConfig, services: AuthServices) -> Self {
        Self {
            config: Arc::new(config),
            accounts: services.accounts,
            sessions: services.sessions,
        }
    }

    /// Name of the cookie carrying the session token
    pub fn cookie_name(&self) -> &str {
        &self.config.server.cookie_name
    }
}
