//! Login challenge endpoints.

use axum::{
    Form,
    extract::{RawQuery, State, rejection::FormRejection},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api::{
    AppState, CHALLENGE_TAG,
    error::ApiError,
    pages::{LoginPage, found, render},
};
use crate::challenge::{ChallengeId, ChallengeMethod};
use crate::flows::{FlowOutcome, LoginPrompt};

/// Form posted by the login page.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginForm {
    /// Login challenge the page was rendered for.
    pub challenge: String,
    pub username: String,
    pub password: String,
}

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(login_page))
        .routes(routes!(login_submit))
}

fn prompt_response(state: &AppState, prompt: &LoginPrompt) -> Response {
    let status = if prompt.error {
        StatusCode::FORBIDDEN
    } else {
        StatusCode::OK
    };
    render(&LoginPage::new(&state.pages.login, prompt), status)
}

/// Start the login flow for a challenge issued by the authorization server.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/login",
    tag = CHALLENGE_TAG,
    operation_id = "Login Challenge",
    summary = "Handle a login challenge",
    description = "Reads the login challenge from the authorization server. A challenge the server \
                   marks as skippable is accepted right away and the user agent is redirected; \
                   otherwise the login form is rendered.",
    params(
        ("login_challenge" = String, Query, description = "Login challenge id, exactly once."),
    ),
    responses(
        (status = 200, description = "Login form HTML", body = String, content_type = "text/html"),
        (status = 302, description = "Challenge accepted, continue at Location"),
        (status = 400, description = "Missing or repeated challenge parameter", body = ApiError),
        (status = 502, description = "Authorization server call failed", body = ApiError),
    )
)]
async fn login_page(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let challenge = ChallengeId::from_query(query.as_deref(), ChallengeMethod::Login)?;
    Ok(match state.flows.login.begin_login(&challenge).await? {
        FlowOutcome::Prompt(prompt) => prompt_response(&state, &prompt),
        FlowOutcome::Redirect(redirect) => found(redirect),
    })
}

/// Check submitted credentials.
#[tracing::instrument(skip(state, form), fields(username = tracing::field::Empty))]
#[utoipa::path(
    post,
    path = "/login",
    tag = CHALLENGE_TAG,
    operation_id = "Login Submit",
    summary = "Submit login credentials",
    description = "Verifies username and password. On success the login challenge is accepted with \
                   the username as subject and the user agent is redirected. Wrong credentials \
                   re-render the form with an error and HTTP 403; the challenge stays open.",
    request_body(
        content = LoginForm,
        content_type = "application/x-www-form-urlencoded",
        description = "Credentials and the challenge id"
    ),
    responses(
        (status = 302, description = "Challenge accepted, continue at Location"),
        (status = 400, description = "Missing, repeated or malformed form fields", body = ApiError),
        (status = 403, description = "Wrong credentials, form rendered again", body = String, content_type = "text/html"),
        (status = 502, description = "Authorization server call failed", body = ApiError),
    )
)]
async fn login_submit(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form?;
    tracing::Span::current().record("username", form.username.as_str());
    let challenge = ChallengeId::new(form.challenge)?;
    let outcome = state
        .flows
        .login
        .submit_login(&challenge, &form.username, &form.password)
        .await?;
    Ok(match outcome {
        FlowOutcome::Prompt(prompt) => prompt_response(&state, &prompt),
        FlowOutcome::Redirect(redirect) => found(redirect),
    })
}
