//! Gatehouse Web Server
//!
//! Server-rendered login, logout and admin provisioning pages on top of
//! `gatehouse-auth`, with SQLite persistence.

pub mod database;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod templates;

// Re-export main types
pub use middleware::CurrentIdentity;
pub use server::{GatehouseServer, GatehouseServerBuilder};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Router,
};
use gatehouse_auth::AuthError;
use gatehouse_core::GatehouseError;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::public_routes())
        .merge(routes::anonymous_routes())
        .merge(routes::authenticated_routes())
        .merge(routes::admin_routes())
        .fallback(handlers::not_found)
        // Identity is resolved before any route layer runs
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_identity,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .with_state(state)
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Core error: {0}")]
    Core(#[from] GatehouseError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match &self {
            WebError::Core(e) | WebError::Auth(AuthError::Infrastructure(e)) => e.log(),
            other => error!(error = %other, "Request failed"),
        }

        let page = templates::ErrorTemplate::new(
            StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            "Something went wrong on our side. Please try again.".to_string(),
        );

        match askama::Template::render(&page) {
            Ok(body) => (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response(),
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
