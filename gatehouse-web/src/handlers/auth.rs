//! Login and logout

use super::{render, CredentialsForm};
use crate::{templates::LoginTemplate, AppState, WebError, WebResult};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use gatehouse_auth::SessionToken;
use tracing::info;

fn session_cookie(state: &AppState, token: SessionToken) -> Cookie<'static> {
    Cookie::build((state.cookie_name().to_string(), token.into_inner()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.server.secure_cookie)
        .build()
}

/// Show the login form
pub async fn login_form() -> WebResult<Response> {
    Ok(render(LoginTemplate::new(None))?.into_response())
}

/// Check credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> WebResult<Response> {
    let user = match state.accounts.login(&form.username, &form.password).await {
        Ok(user) => user,
        Err(e) => match e.user_message() {
            Some(message) => return Ok(render(LoginTemplate::new(Some(message)))?.into_response()),
            None => return Err(WebError::Auth(e)),
        },
    };

    let previous = jar.get(state.cookie_name()).map(|c| c.value().to_string());
    let token = state
        .sessions
        .create(previous.as_deref(), user.id, user.role)
        .await?;

    let jar = jar.add(session_cookie(&state, token));
    Ok((jar, Redirect::to("/")).into_response())
}

/// End the session and clear the cookie
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> WebResult<Response> {
    if let Some(cookie) = jar.get(state.cookie_name()) {
        state.sessions.destroy(cookie.value()).await?;
    }

    info!("User logged out");
    let jar = jar.remove(Cookie::build((state.cookie_name().to_string(), "")).path("/"));
    Ok((jar, Redirect::to("/")).into_response())
}
