//! Account service - login and provisioning
//!
//! Owns the credential checks behind the login and add-user/add-admin forms.
//! Sessions are not created here; the caller hands the returned [`User`] to
//! the [`crate::SessionManager`].

use crate::error::{AuthError, AuthResult, AuthenticationError, ValidationError};
use crate::hasher::PasswordHasher;
use gatehouse_core::{CredentialStore, GatehouseError, NewUser, Role, User};
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
}

impl AccountService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            hasher: PasswordHasher::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Check a username/password pair.
    ///
    /// Unknown usernames and wrong passwords are reported separately.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<User> {
        let Some(user) = self.store.find_by_username(username).await? else {
            warn!("Login rejected: unknown username");
            return Err(AuthenticationError::UnknownUsername.into());
        };

        if !self.hasher.verify(&user.password_hash, password) {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthenticationError::WrongPassword.into());
        }

        info!(user_id = %user.id, role = %user.role, "Login accepted");
        Ok(user)
    }

    /// Create an account with a fixed role.
    ///
    /// The first failing check wins: empty username, empty password, taken
    /// username.
    #[instrument(skip(self, password))]
    pub async fn provision(&self, role: Role, username: &str, password: &str) -> AuthResult<User> {
        if username.is_empty() {
            return Err(ValidationError::UsernameRequired.into());
        }
        if password.is_empty() {
            return Err(ValidationError::PasswordRequired.into());
        }
        if self.store.username_exists(username).await? {
            return Err(ValidationError::AlreadyRegistered(username.to_string()).into());
        }

        let password_hash = self.hasher.hash(password)?;
        let user = self
            .store
            .insert(NewUser {
                username: username.to_string(),
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent insert of the same name
                GatehouseError::Duplicate { .. } => {
                    AuthError::from(ValidationError::AlreadyRegistered(username.to_string()))
                }
                other => AuthError::from(other),
            })?;

        info!(user_id = %user.id, "Account provisioned");
        Ok(user)
    }
}
