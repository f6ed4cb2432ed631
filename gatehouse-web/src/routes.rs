//! Route definitions grouped by the guard that protects them

use crate::{handlers, middleware, templates::provision_path, AppState};
use axum::{routing::get, Extension, Router};
use gatehouse_core::Role;

/// Routes open to everyone
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::index))
}

/// Routes for clients without a session
pub fn anonymous_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(handlers::auth::login_form).post(handlers::auth::login),
        )
        .route_layer(axum::middleware::from_fn(middleware::require_anonymous))
}

/// Routes for any logged-in user
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", get(handlers::auth::logout))
        .route_layer(axum::middleware::from_fn(middleware::require_authenticated))
}

/// Admin dashboard; add-user and add-admin share one handler
pub fn admin_routes() -> Router<AppState> {
    let provisioning = |role: Role| {
        get(handlers::admin::provision_form)
            .post(handlers::admin::provision)
            .layer(Extension(role))
    };

    Router::new()
        .route("/dashboard", get(handlers::admin::dashboard))
        .route(provision_path(Role::User), provisioning(Role::User))
        .route(provision_path(Role::Admin), provisioning(Role::Admin))
        .route(
            "/dashboard/reset_password",
            get(handlers::admin::reset_password),
        )
        .route_layer(axum::middleware::from_fn(middleware::require_admin))
}
