//! Session types

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};

const TOKEN_BYTES: usize = 32;

/// Opaque value correlating a client with server-side session state
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Fresh token from the OS CSPRNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "SessionToken({}…)", prefix)
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session lifetime policy
#[derive(Debug, Clone, Default)]
pub struct SessionPolicy {
    /// Sessions idle longer than this resolve as anonymous; `None` = no expiry
    pub idle_timeout: Option<Duration>,
}

impl SessionPolicy {
    pub fn never_expire() -> Self {
        Self { idle_timeout: None }
    }

    /// Timeouts too large for a `Duration` behave as no expiry
    pub fn idle_timeout_secs(secs: u64) -> Self {
        Self {
            idle_timeout: i64::try_from(secs).ok().and_then(Duration::try_seconds),
        }
    }

    /// Sessions last seen before the returned instant are idle.
    ///
    /// `None` when there is no timeout or the cutoff predates the
    /// representable range, in which case nothing is idle.
    pub fn idle_cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        now.checked_sub_signed(self.idle_timeout?)
    }
}

impl From<&gatehouse_core::SessionConfig> for SessionPolicy {
    fn from(config: &gatehouse_core::SessionConfig) -> Self {
        match config.idle_timeout_secs {
            Some(secs) => Self::idle_timeout_secs(secs),
            None => Self::never_expire(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique_and_url_safe() {
        let a = SessionToken::generate();
        let b = SessionToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 43);
        assert!(a
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let token = SessionToken::generate();
        let debug = format!("{:?}", token);
        assert!(!debug.contains(token.as_str()));
    }

    #[test]
    fn test_policy_from_config() {
        let mut config = gatehouse_core::SessionConfig::default();
        assert!(SessionPolicy::from(&config).idle_timeout.is_none());

        config.idle_timeout_secs = Some(60);
        assert_eq!(
            SessionPolicy::from(&config).idle_timeout,
            Some(Duration::seconds(60))
        );
    }

    #[test]
    fn test_huge_timeout_never_goes_negative() {
        for secs in [u64::MAX, i64::MAX as u64, 10_000_000_000_000] {
            let policy = SessionPolicy::idle_timeout_secs(secs);
            if let Some(timeout) = policy.idle_timeout {
                assert!(timeout > Duration::zero(), "{secs} wrapped to {timeout}");
            }
            let now = Utc::now();
            if let Some(cutoff) = policy.idle_cutoff(now) {
                assert!(cutoff < now);
            }
        }
    }

    #[test]
    fn test_idle_cutoff() {
        let now = Utc::now();
        assert!(SessionPolicy::never_expire().idle_cutoff(now).is_none());
        assert_eq!(
            SessionPolicy::idle_timeout_secs(60).idle_cutoff(now),
            Some(now - Duration::seconds(60))
        );
        // Cutoff before the earliest representable instant
        assert!(SessionPolicy::idle_timeout_secs(10_000_000_000_000)
            .idle_cutoff(now)
            .is_none());
    }
}
