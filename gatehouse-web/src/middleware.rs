//! Gatehouse Web Middleware
//!
//! `resolve_identity` turns the session cookie into an [`IdentityContext`]
//! stored in the request extensions. The guard layers read it from there and
//! either pass the request through untouched or redirect.

use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use gatehouse_auth::{Denial, Guard, IdentityContext};
use std::convert::Infallible;
use tracing::debug;

/// Redirect target for a guard denial
pub fn denial_location(denial: Denial) -> &'static str {
    match denial {
        Denial::Login => "/login",
        Denial::Logout => "/logout",
        Denial::Home => "/",
    }
}

/// Resolve the session cookie once per request
pub async fn resolve_identity(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = jar.get(state.cookie_name()).map(|cookie| cookie.value());
    let identity = state.sessions.resolve(token).await;

    debug!(identity = %identity.summary(), path = %request.uri().path(), "Resolved request identity");
    request.extensions_mut().insert(identity);

    next.run(request).await
}

async fn guard(guard: Guard, request: Request, next: Next) -> Response {
    let identity = request
        .extensions()
        .get::<IdentityContext>()
        .cloned()
        .unwrap_or_default();

    match guard.check(&identity) {
        Ok(()) => next.run(request).await,
        Err(denial) => {
            debug!(
                guard = %guard,
                identity = %identity.summary(),
                path = %request.uri().path(),
                "Guard denied request, redirecting to {}",
                denial
            );
            Redirect::to(denial_location(denial)).into_response()
        }
    }
}

/// Only logged-in users pass; others go to the login page
pub async fn require_authenticated(request: Request, next: Next) -> Response {
    guard(Guard::Authenticated, request, next).await
}

/// Only anonymous clients pass; logged-in users go to logout
pub async fn require_anonymous(request: Request, next: Next) -> Response {
    guard(Guard::Anonymous, request, next).await
}

/// Only admins pass; everyone else goes home
pub async fn require_admin(request: Request, next: Next) -> Response {
    guard(Guard::AdminRole, request, next).await
}

/// The identity resolved for this request
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub IdentityContext);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<IdentityContext>()
                .cloned()
                .unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use gatehouse_core::{Role, UserId};
    use tower::ServiceExt;

    fn admin() -> IdentityContext {
        IdentityContext::Authenticated {
            user_id: UserId(1),
            username: "root".into(),
            role: Role::Admin,
        }
    }

    async fn status_and_location(identity: Option<IdentityContext>) -> (StatusCode, Option<String>) {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .route_layer(middleware::from_fn(require_admin));

        let mut request = axum::http::Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap();
        if let Some(identity) = identity {
            request.extensions_mut().insert(identity);
        }

        let response = app.oneshot(request).await.unwrap();
        let location = response
            .headers()
            .get("location")
            .map(|v| v.to_str().unwrap().to_string());
        (response.status(), location)
    }

    #[test]
    fn test_denial_locations() {
        assert_eq!(denial_location(Denial::Login), "/login");
        assert_eq!(denial_location(Denial::Logout), "/logout");
        assert_eq!(denial_location(Denial::Home), "/");
    }

    #[tokio::test]
    async fn test_admin_guard_passes_admin() {
        let (status, location) = status_and_location(Some(admin())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(location.is_none());
    }

    #[tokio::test]
    async fn test_missing_identity_is_treated_as_anonymous() {
        let (status, location) = status_and_location(None).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/"));
    }
}
