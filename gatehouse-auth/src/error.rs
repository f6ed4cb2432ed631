//! Request-level error taxonomy
//!
//! Validation and authentication failures are shown to the user on the form
//! that produced them. Authorization failures are silent redirects.

use crate::guards::Denial;
use gatehouse_core::GatehouseError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Rejected provisioning input; checked in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Username is required.")]
    UsernameRequired,
    #[error("Password is required.")]
    PasswordRequired,
    #[error("User {0} is already registered.")]
    AlreadyRegistered(String),
}

/// Rejected login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    #[error("Incorrect username.")]
    UnknownUsername,
    #[error("Incorrect password.")]
    WrongPassword,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error("Access denied, redirecting to {0}")]
    Authorization(Denial),

    #[error(transparent)]
    Infrastructure(#[from] GatehouseError),
}

impl AuthError {
    /// Message to show on the originating form, if this failure has one
    pub fn user_message(&self) -> Option<String> {
        match self {
            AuthError::Validation(e) => Some(e.to_string()),
            AuthError::Authentication(e) => Some(e.to_string()),
            AuthError::Authorization(_) | AuthError::Infrastructure(_) => None,
        }
    }
}

impl From<Denial> for AuthError {
    fn from(denial: Denial) -> Self {
        AuthError::Authorization(denial)
    }
}
