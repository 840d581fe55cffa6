//! Logout challenge endpoints.

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
    pages::{LogoutPage, found, render},
};
use crate::challenge::{ChallengeId, ChallengeMethod};
use crate::flows::FlowOutcome;

/// Form posted by the logout confirmation page.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LogoutForm {
    pub challenge: String,
    /// `true` confirms the logout, anything else cancels it.
    pub accept: String,
}

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(logout_page))
        .routes(routes!(logout_submit))
}

#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/logout",
    tag = CHALLENGE_TAG,
    operation_id = "Logout Challenge",
    summary = "Handle a logout challenge",
    description = "Logouts initiated by a relying party ask the user for confirmation. Any other \
                   logout is accepted right away and the user agent is redirected.",
    params(
        ("logout_challenge" = String, Query, description = "Logout challenge id, exactly once."),
    ),
    responses(
        (status = 200, description = "Logout confirmation HTML", body = String, content_type = "text/html"),
        (status = 302, description = "Logout accepted, continue at Location"),
        (status = 400, description = "Missing or repeated challenge parameter", body = ApiError),
        (status = 502, description = "Authorization server call failed", body = ApiError),
    )
)]
async fn logout_page(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let challenge = ChallengeId::from_query(query.as_deref(), ChallengeMethod::Logout)?;
    Ok(match state.flows.logout.begin_logout(&challenge).await? {
        FlowOutcome::Prompt(prompt) => render(
            &LogoutPage::new(&state.pages.logout, &prompt),
            StatusCode::OK,
        ),
        FlowOutcome::Redirect(redirect) => found(redirect),
    })
}

#[tracing::instrument(skip(state, form))]
#[utoipa::path(
    post,
    path = "/logout",
    tag = CHALLENGE_TAG,
    operation_id = "Logout Submit",
    summary = "Confirm or cancel a logout",
    request_body(
        content = LogoutForm,
        content_type = "application/x-www-form-urlencoded",
        description = "Logout decision and the challenge id"
    ),
    responses(
        (status = 302, description = "Decision recorded, continue at Location"),
        (status = 400, description = "Missing, repeated or malformed form fields", body = ApiError),
        (status = 502, description = "Authorization server call failed", body = ApiError),
    )
)]
async fn logout_submit(
    State(state): State<AppState>,
    form: Result<Form<LogoutForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form?;
    let challenge = ChallengeId::new(form.challenge)?;
    let redirect = state
        .flows
        .logout
        .submit_logout(&challenge, form.accept == "true")
        .await?;
    Ok(found(redirect))
}
