//! Password hashing
//!
//! Argon2id with a per-password random salt, stored as a PHC string.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use gatehouse_core::{ErrorContext, GatehouseError, GatehouseResult};
use tracing::debug;

/// One-way salted hash with constant-time verification
#[derive(Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a plaintext password
    pub fn hash(&self, plaintext: &str) -> GatehouseResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| GatehouseError::Hashing {
                message: e.to_string(),
                context: ErrorContext::new("password_hasher").with_operation("hash"),
            })
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// A digest that does not parse is treated as a mismatch.
    pub fn verify(&self, digest: &str, plaintext: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Stored password digest is malformed: {}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
