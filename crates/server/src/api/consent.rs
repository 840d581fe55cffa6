//! Consent challenge endpoints.

use axum::{
    extract::{RawForm, RawQuery, State},
    http::StatusCode,
    response::Response,
};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api::{
    AppState, CHALLENGE_TAG,
    error::ApiError,
    pages::{ConsentPage, found, render},
};
use crate::challenge::{ChallengeId, ChallengeMethod};
use crate::error::FlowError;
use crate::flows::{ConsentSubmission, FlowOutcome};

/// Form posted by the consent page.
///
/// `scope` and `audience` repeat once per ticked checkbox, so the body is
/// parsed by hand instead of through `Form`.
#[derive(Debug, Default, ToSchema, PartialEq, Eq)]
pub struct ConsentForm {
    pub challenge: String,
    /// Ticked scopes, one field per scope.
    pub scope: Vec<String>,
    /// Ticked audiences, one field per audience.
    pub audience: Vec<String>,
    /// User the consent is for (username or email).
    pub subject: String,
    pub client_id: String,
    /// `approve` (default) or `deny`.
    pub action: Option<String>,
}

impl ConsentForm {
    /// Parse the url-encoded body. A repeated `challenge` field is rejected.
    pub fn parse(body: &[u8]) -> Result<Self, FlowError> {
        let mut form = ConsentForm::default();
        let mut challenge_seen = false;
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "challenge" => {
                    if challenge_seen {
                        return Err(FlowError::Validation(
                            "more than one challenge form field".into(),
                        ));
                    }
                    challenge_seen = true;
                    form.challenge = value.into_owned();
                }
                "scope" => form.scope.push(value.into_owned()),
                "audience" => form.audience.push(value.into_owned()),
                "subject" => form.subject = value.into_owned(),
                "client_id" => form.client_id = value.into_owned(),
                "action" => form.action = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(form)
    }

    pub fn is_denied(&self) -> bool {
        self.action.as_deref() == Some("deny")
    }
}

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(consent_page))
        .routes(routes!(consent_submit))
}

/// Start the consent flow for a challenge issued by the authorization server.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/consent",
    tag = CHALLENGE_TAG,
    operation_id = "Consent Challenge",
    summary = "Handle a consent challenge",
    description = "Reads the consent challenge. A skippable challenge is granted everything the \
                   client requested, with the user's roles for that client attached to the session; \
                   otherwise the consent page listing the requested scopes and audiences is rendered.",
    params(
        ("consent_challenge" = String, Query, description = "Consent challenge id, exactly once."),
    ),
    responses(
        (status = 200, description = "Consent page HTML", body = String, content_type = "text/html"),
        (status = 302, description = "Challenge accepted, continue at Location"),
        (status = 400, description = "Missing or repeated challenge parameter", body = ApiError),
        (status = 500, description = "User unknown or store failure", body = ApiError),
        (status = 502, description = "Authorization server call failed", body = ApiError),
    )
)]
async fn consent_page(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let challenge = ChallengeId::from_query(query.as_deref(), ChallengeMethod::Consent)?;
    Ok(match state.flows.consent.begin_consent(&challenge).await? {
        FlowOutcome::Prompt(prompt) => render(
            &ConsentPage::new(&state.pages.consent, &prompt),
            StatusCode::OK,
        ),
        FlowOutcome::Redirect(redirect) => found(redirect),
    })
}

/// Grant or deny what the user chose on the consent page.
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    post,
    path = "/consent",
    tag = CHALLENGE_TAG,
    operation_id = "Consent Submit",
    summary = "Submit a consent decision",
    description = "With `action=deny` the challenge is rejected with `access_denied`. Otherwise the \
                   ticked scopes and audiences are granted and the user's roles for `client_id` \
                   are attached to both token sessions.",
    request_body(
        content = ConsentForm,
        content_type = "application/x-www-form-urlencoded",
        description = "Consent decision and the challenge id"
    ),
    responses(
        (status = 302, description = "Decision recorded, continue at Location"),
        (status = 400, description = "Missing or repeated challenge", body = ApiError),
        (status = 500, description = "User unknown or store failure", body = ApiError),
        (status = 502, description = "Authorization server call failed", body = ApiError),
    )
)]
async fn consent_submit(
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> Result<Response, ApiError> {
    let form = ConsentForm::parse(&body)?;
    let challenge = ChallengeId::new(form.challenge.as_str())?;

    if form.is_denied() {
        let redirect = state.flows.consent.deny_consent(&challenge).await?;
        return Ok(found(redirect));
    }

    let redirect = state
        .flows
        .consent
        .submit_consent(ConsentSubmission {
            challenge,
            approved_scopes: form.scope,
            approved_audiences: form.audience,
            identifier: form.subject,
            client_id: form.client_id,
        })
        .await?;
    Ok(found(redirect))
}
