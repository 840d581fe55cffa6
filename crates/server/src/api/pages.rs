//! HTML pages shown while a challenge waits for the user.

use askama::Template;
use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};

use crate::api::error::ApiError;
use crate::challenge::Redirect;
use crate::config::{ConsentPageCopy, LoginPageCopy, LogoutPageCopy};
use crate::flows::{ConsentPrompt, LoginPrompt, LogoutPrompt, PromptEntry};

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage<'a> {
    pub copy: &'a LoginPageCopy,
    pub challenge: &'a str,
    pub error: bool,
}

impl<'a> LoginPage<'a> {
    pub fn new(copy: &'a LoginPageCopy, prompt: &'a LoginPrompt) -> Self {
        Self {
            copy,
            challenge: prompt.challenge.as_str(),
            error: prompt.error,
        }
    }
}

#[derive(Template)]
#[template(path = "consent.html")]
pub struct ConsentPage<'a> {
    pub copy: &'a ConsentPageCopy,
    pub request_message: String,
    pub challenge: &'a str,
    pub subject: &'a str,
    pub client_id: &'a str,
    pub scopes: &'a [PromptEntry],
    pub audiences: &'a [PromptEntry],
}

impl<'a> ConsentPage<'a> {
    pub fn new(copy: &'a ConsentPageCopy, prompt: &'a ConsentPrompt) -> Self {
        let client = if prompt.client.name.is_empty() {
            prompt.client.id.as_str()
        } else {
            prompt.client.name.as_str()
        };
        Self {
            copy,
            request_message: copy.request_message.replace("{client}", client),
            challenge: prompt.challenge.as_str(),
            subject: &prompt.subject,
            client_id: &prompt.client.id,
            scopes: &prompt.scopes,
            audiences: &prompt.audiences,
        }
    }
}

#[derive(Template)]
#[template(path = "logout.html")]
pub struct LogoutPage<'a> {
    pub copy: &'a LogoutPageCopy,
    pub challenge: &'a str,
    pub subject: &'a str,
}

impl<'a> LogoutPage<'a> {
    pub fn new(copy: &'a LogoutPageCopy, prompt: &'a LogoutPrompt) -> Self {
        Self {
            copy,
            challenge: prompt.challenge.as_str(),
            subject: &prompt.subject,
        }
    }
}

/// Render `page` with `status`; a template failure becomes a 500.
pub fn render<T: Template>(page: &T, status: StatusCode) -> Response {
    match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render page: {}", e);
            ApiError::server_error().into_response()
        }
    }
}

/// Send the user agent on to where the authorization server told us.
pub fn found(redirect: Redirect) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, redirect.url)]).into_response()
}
