//! Gatehouse Auth - credential verification, sessions and access guards
//!
//! This crate holds everything between the HTTP layer and storage:
//!
//! - Password hashing and verification
//! - Login and account provisioning ([`AccountService`])
//! - Server-side sessions mapping opaque tokens to accounts ([`SessionManager`])
//! - The per-request [`IdentityContext`] and the [`Guard`]s that gate handlers
//!
//! ## Architecture
//!
//! - **Contracts** (gatehouse-core): data types and storage traits
//! - **Policy** (this crate): who may do what, and with which credentials
//! - **Presentation** (gatehouse-web/cli): forms, cookies and redirects

pub mod accounts;
pub mod error;
pub mod guards;
pub mod hasher;
pub mod identity;
pub mod session;
pub mod store;

pub use accounts::AccountService;
pub use error::{AuthError, AuthResult, AuthenticationError, ValidationError};
pub use guards::{
    check_all, require_admin_role, require_anonymous, require_authenticated, Denial, Guard,
};
pub use hasher::PasswordHasher;
pub use identity::IdentityContext;
pub use session::{MemorySessionStore, SessionManager, SessionPolicy, SessionToken};
pub use store::MemoryCredentialStore;

use gatehouse_core::{CredentialStore, SessionStore};
use std::sync::Arc;

/// Account service and session manager sharing one credential store
#[derive(Clone)]
pub struct AuthServices {
    pub accounts: AccountService,
    pub sessions: SessionManager,
}

impl AuthServices {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            accounts: AccountService::new(credentials.clone()),
            sessions: SessionManager::new(sessions, credentials, policy),
        }
    }

    /// Services backed entirely by process memory
    pub fn in_memory(policy: SessionPolicy) -> Self {
        Self::new(
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MemorySessionStore::new()),
            policy,
        )
    }
}
