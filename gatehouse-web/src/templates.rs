//! Template system for server-side rendering
//!
//! This module provides templates for server-side rendering using Askama.

use askama::Template;
use gatehouse_auth::IdentityContext;
use gatehouse_core::Role;

const APP_NAME: &str = "Gatehouse";

/// Home page showing who is logged in
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub username: Option<String>,
    pub role: Option<String>,
    pub is_admin: bool,
}

/// Login form
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub title: String,
    pub error: Option<String>,
}

/// Admin landing page
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub title: String,
    pub username: String,
}

/// Add-user / add-admin form
#[derive(Template)]
#[template(path = "provision.html")]
pub struct ProvisionTemplate {
    pub title: String,
    pub heading: String,
    pub action: String,
    pub error: Option<String>,
}

/// Password reset placeholder
#[derive(Template)]
#[template(path = "reset_password.html")]
pub struct ResetPasswordTemplate {
    pub title: String,
}

/// Error page template
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub error_code: u16,
    pub error_message: String,
}

impl IndexTemplate {
    pub fn new(identity: &IdentityContext) -> Self {
        Self {
            title: APP_NAME.to_string(),
            username: identity.username().map(str::to_string),
            role: identity.role().map(|r| r.to_string()),
            is_admin: identity.is_admin(),
        }
    }
}

impl LoginTemplate {
    pub fn new(error: Option<String>) -> Self {
        Self {
            title: format!("Log In - {}", APP_NAME),
            error,
        }
    }
}

impl DashboardTemplate {
    pub fn new(identity: &IdentityContext) -> Self {
        Self {
            title: format!("Dashboard - {}", APP_NAME),
            username: identity.username().unwrap_or_default().to_string(),
        }
    }
}

impl ProvisionTemplate {
    pub fn new(role: Role, error: Option<String>) -> Self {
        let heading = match role {
            Role::User => "Add User",
            Role::Admin => "Add Admin",
        };

        Self {
            title: format!("{} - {}", heading, APP_NAME),
            heading: heading.to_string(),
            action: provision_path(role).to_string(),
            error,
        }
    }
}

impl ResetPasswordTemplate {
    pub fn new() -> Self {
        Self {
            title: format!("Reset Password - {}", APP_NAME),
        }
    }
}

impl Default for ResetPasswordTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorTemplate {
    pub fn new(error_code: u16, error_message: String) -> Self {
        Self {
            title: format!("Error {} - {}", error_code, APP_NAME),
            error_code,
            error_message,
        }
    }
}

/// Route serving the provisioning form for `role`
pub fn provision_path(role: Role) -> &'static str {
    match role {
        Role::User => "/dashboard/add_user",
        Role::Admin => "/dashboard/add_admin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::UserId;

    #[test]
    fn test_login_renders_error() {
        let html = LoginTemplate::new(Some("Incorrect username.".into()))
            .render()
            .unwrap();
        assert!(html.contains("Incorrect username."));
        assert!(html.contains("name=\"password\""));
    }

    #[test]
    fn test_provision_form_targets_role_route() {
        let html = ProvisionTemplate::new(Role::Admin, None).render().unwrap();
        assert!(html.contains("action=\"/dashboard/add_admin\""));
        assert!(html.contains("Add Admin"));
    }

    #[test]
    fn test_usernames_are_escaped() {
        let identity = IdentityContext::Authenticated {
            user_id: UserId(1),
            username: "<script>".into(),
            role: Role::User,
        };
        let html = IndexTemplate::new(&identity).render().unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("script"));
    }
}
