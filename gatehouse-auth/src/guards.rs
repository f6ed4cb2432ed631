//! Access guards
//!
//! A guard inspects the request identity and either lets the handler run or
//! names where the client should be sent instead. Denials carry no message.

use crate::identity::IdentityContext;
use serde::{Deserialize, Serialize};

/// Where a denied request is redirected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Denial {
    /// Not logged in; go to the login entry point
    Login,
    /// Already logged in; go to the logout entry point
    Logout,
    /// Logged in without the required role; go home
    Home,
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Denial::Login => write!(f, "login"),
            Denial::Logout => write!(f, "logout"),
            Denial::Home => write!(f, "home"),
        }
    }
}

/// Gating predicate applied before a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Guard {
    /// Requires a logged-in user
    Authenticated,
    /// Requires no logged-in user (the login form)
    Anonymous,
    /// Requires a logged-in user whose role is admin
    AdminRole,
}

impl Guard {
    pub fn check(&self, identity: &IdentityContext) -> Result<(), Denial> {
        match self {
            Guard::Authenticated => require_authenticated(identity),
            Guard::Anonymous => require_anonymous(identity),
            Guard::AdminRole => require_admin_role(identity),
        }
    }
}

impl std::fmt::Display for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Guard::Authenticated => write!(f, "authenticated"),
            Guard::Anonymous => write!(f, "anonymous"),
            Guard::AdminRole => write!(f, "admin_role"),
        }
    }
}

pub fn require_authenticated(identity: &IdentityContext) -> Result<(), Denial> {
    if identity.is_anonymous() {
        return Err(Denial::Login);
    }
    Ok(())
}

pub fn require_anonymous(identity: &IdentityContext) -> Result<(), Denial> {
    if identity.is_authenticated() {
        return Err(Denial::Logout);
    }
    Ok(())
}

pub fn require_admin_role(identity: &IdentityContext) -> Result<(), Denial> {
    if !identity.is_admin() {
        return Err(Denial::Home);
    }
    Ok(())
}

/// Run every guard in order; the first denial wins
pub fn check_all(guards: &[Guard], identity: &IdentityContext) -> Result<(), Denial> {
    guards.iter().try_for_each(|guard| guard.check(identity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::{Role, UserId};

    fn authed(role: Role) -> IdentityContext {
        IdentityContext::Authenticated {
            user_id: UserId(1),
            username: "bob".to_string(),
            role,
        }
    }

    #[test]
    fn test_authenticated_guard() {
        assert_eq!(
            Guard::Authenticated.check(&IdentityContext::Anonymous),
            Err(Denial::Login)
        );
        assert!(Guard::Authenticated.check(&authed(Role::User)).is_ok());
        assert!(Guard::Authenticated.check(&authed(Role::Admin)).is_ok());
    }

    #[test]
    fn test_anonymous_guard() {
        assert!(Guard::Anonymous.check(&IdentityContext::Anonymous).is_ok());
        assert_eq!(
            Guard::Anonymous.check(&authed(Role::User)),
            Err(Denial::Logout)
        );
    }

    #[test]
    fn test_admin_guard() {
        assert_eq!(
            Guard::AdminRole.check(&IdentityContext::Anonymous),
            Err(Denial::Home)
        );
        assert_eq!(Guard::AdminRole.check(&authed(Role::User)), Err(Denial::Home));
        assert!(Guard::AdminRole.check(&authed(Role::Admin)).is_ok());
    }

    #[test]
    fn test_composition_stops_at_first_denial() {
        let guards = [Guard::Authenticated, Guard::AdminRole];
        assert_eq!(
            check_all(&guards, &IdentityContext::Anonymous),
            Err(Denial::Login)
        );
        assert_eq!(check_all(&guards, &authed(Role::User)), Err(Denial::Home));
        assert!(check_all(&guards, &authed(Role::Admin)).is_ok());
        assert!(check_all(&[], &IdentityContext::Anonymous).is_ok());
    }
}
