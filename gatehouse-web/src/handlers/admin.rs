//! Admin dashboard and account provisioning

use super::{render, CredentialsForm};
use crate::{
    templates::{DashboardTemplate, ProvisionTemplate, ResetPasswordTemplate},
    AppState, CurrentIdentity, WebError, WebResult,
};
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use gatehouse_core::Role;
use tracing::info;

pub async fn dashboard(CurrentIdentity(identity): CurrentIdentity) -> WebResult<Html<String>> {
    render(DashboardTemplate::new(&identity))
}

/// Show the provisioning form for the role fixed by the route
pub async fn provision_form(Extension(role): Extension<Role>) -> WebResult<Html<String>> {
    render(ProvisionTemplate::new(role, None))
}

/// Create an account with the role fixed by the route.
///
/// Validation failures re-render the form with the message; success sends
/// the client to the login page.
pub async fn provision(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    CurrentIdentity(identity): CurrentIdentity,
    Form(form): Form<CredentialsForm>,
) -> WebResult<Response> {
    match state
        .accounts
        .provision(role, &form.username, &form.password)
        .await
    {
        Ok(user) => {
            info!(
                admin = %identity.summary(),
                user_id = %user.id,
                role = %role,
                "Account created from dashboard"
            );
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => match e.user_message() {
            Some(message) => Ok(render(ProvisionTemplate::new(role, Some(message)))?.into_response()),
            None => Err(WebError::Auth(e)),
        },
    }
}

pub async fn reset_password() -> WebResult<Html<String>> {
    render(ResetPasswordTemplate::new())
}
