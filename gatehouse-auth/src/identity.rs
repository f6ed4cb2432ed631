//! Request identity
//!
//! The identity resolved from the session once per request. Handlers and
//! guards receive it explicitly; nothing reads it from global state.

use gatehouse_core::{Role, User, UserId};
use serde::Serialize;

/// Who is making the current request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IdentityContext {
    /// No session, or a session that no longer resolves
    #[default]
    Anonymous,
    /// A live session bound to a stored account
    Authenticated {
        user_id: UserId,
        username: String,
        role: Role,
    },
}

impl IdentityContext {
    /// Context for a stored account; the role is the one on the account row
    pub fn for_user(user: &User) -> Self {
        Self::Authenticated {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    pub fn is_authenticated(&self) -> bool {
        !self.is_anonymous()
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Authenticated { role: Role::Admin, .. })
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Authenticated { user_id, .. } => Some(*user_id),
            Self::Anonymous => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Authenticated { username, .. } => Some(username),
            Self::Anonymous => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Authenticated { role, .. } => Some(*role),
            Self::Anonymous => None,
        }
    }

    /// Short form for log fields
    pub fn summary(&self) -> String {
        match self {
            Self::Authenticated {
                user_id,
                username,
                role,
            } => format!("{}#{}({})", username, user_id, role),
            Self::Anonymous => "anonymous".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: UserId(7),
            username: "alice".to_string(),
            password_hash: String::new(),
            role,
        }
    }

    #[test]
    fn test_anonymous_context() {
        let ctx = IdentityContext::default();
        assert!(ctx.is_anonymous());
        assert!(!ctx.is_admin());
        assert_eq!(ctx.user_id(), None);
        assert_eq!(ctx.summary(), "anonymous");
    }

    #[test]
    fn test_user_context() {
        let ctx = IdentityContext::for_user(&user(Role::User));
        assert!(ctx.is_authenticated());
        assert!(!ctx.is_admin());
        assert_eq!(ctx.user_id(), Some(UserId(7)));
        assert_eq!(ctx.username(), Some("alice"));
        assert_eq!(ctx.summary(), "alice#7(user)");

        let admin = IdentityContext::for_user(&user(Role::Admin));
        assert!(admin.is_admin());
        assert_eq!(admin.role(), Some(Role::Admin));
    }
}
