//! HTTP request handlers
//!
//! Handlers receive the request identity through [`CurrentIdentity`] and
//! render askama templates. Gating happens in route layers, never here.

pub mod admin;
pub mod auth;

use crate::{
    templates::{ErrorTemplate, IndexTemplate},
    CurrentIdentity, WebResult,
};
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde::Deserialize;

/// Username/password form shared by login and provisioning.
///
/// Missing fields become empty strings so they reach validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

pub(crate) fn render<T: Template>(template: T) -> WebResult<Html<String>> {
    Ok(Html(template.render()?))
}

/// Home page
pub async fn index(CurrentIdentity(identity): CurrentIdentity) -> WebResult<Html<String>> {
    render(IndexTemplate::new(&identity))
}

pub async fn not_found() -> impl IntoResponse {
    let page = ErrorTemplate::new(404, "Page not found.".to_string());
    (StatusCode::NOT_FOUND, render(page))
}
