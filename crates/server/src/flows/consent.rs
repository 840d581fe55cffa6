//! Consent challenge flow.

use std::sync::Arc;

use crate::challenge::{
    AcceptConsent, AcceptPayload, ChallengeGateway, ChallengeId, ChallengeMethod, ClientInfo,
    Redirect, RejectReason,
};
use crate::config::ConsentConfig;
use crate::error::FlowError;
use crate::flows::FlowOutcome;
use crate::flows::consent_resolver::{ConsentResolver, ResolvedConsent};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsentSettings {
    pub remember: bool,
    pub remember_for: u64,
    pub restrict_to_requested: bool,
}

impl From<&ConsentConfig> for ConsentSettings {
    fn from(config: &ConsentConfig) -> Self {
        Self {
            remember: config.remember,
            remember_for: config.remember_for,
            restrict_to_requested: config.restrict_to_requested,
        }
    }
}

impl Default for ConsentSettings {
    fn default() -> Self {
        Self::from(&ConsentConfig::default())
    }
}

/// One checkbox on the consent page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptEntry {
    pub name: String,
    pub value: String,
}

/// The consent page must be shown for `challenge`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsentPrompt {
    pub challenge: ChallengeId,
    pub subject: String,
    pub client: ClientInfo,
    pub scopes: Vec<PromptEntry>,
    pub audiences: Vec<PromptEntry>,
}

/// What the user approved on the consent page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsentSubmission {
    pub challenge: ChallengeId,
    pub approved_scopes: Vec<String>,
    pub approved_audiences: Vec<String>,
    /// Username or email echoed back by the page.
    pub identifier: String,
    /// Client id echoed back by the page; selects the role grants.
    pub client_id: String,
}

pub type ConsentOutcome = FlowOutcome<ConsentPrompt>;

#[derive(Clone)]
pub struct ConsentFlow {
    gateway: Arc<dyn ChallengeGateway>,
    resolver: ConsentResolver,
    settings: ConsentSettings,
}

impl ConsentFlow {
    pub fn new(
        gateway: Arc<dyn ChallengeGateway>,
        resolver: ConsentResolver,
        settings: ConsentSettings,
    ) -> Self {
        Self {
            gateway,
            resolver,
            settings,
        }
    }

    #[tracing::instrument(skip(self), fields(challenge = %challenge))]
    pub async fn begin_consent(&self, challenge: &ChallengeId) -> Result<ConsentOutcome, FlowError> {
        let state = self
            .gateway
            .read_challenge(ChallengeMethod::Consent, challenge)
            .await?;

        if !state.skip {
            let scopes = state
                .requested_scopes
                .iter()
                .map(|scope| PromptEntry {
                    name: scope.clone(),
                    value: scope.clone(),
                })
                .collect();
            let audiences = state
                .requested_audiences
                .iter()
                .map(|audience| PromptEntry {
                    name: audience.clone(),
                    value: "true".to_string(),
                })
                .collect();
            return Ok(FlowOutcome::Prompt(ConsentPrompt {
                challenge: challenge.clone(),
                subject: state.subject,
                client: state.client,
                scopes,
                audiences,
            }));
        }

        let resolved = self
            .resolver
            .resolve(
                &state.subject,
                &state.client.id,
                &state.requested_scopes,
                &state.requested_audiences,
            )
            .await?;
        let redirect = self.accept(challenge, resolved).await?;
        tracing::info!(
            subject = %state.subject,
            client_id = %state.client.id,
            "Consent skipped, granted requested access"
        );
        Ok(FlowOutcome::Redirect(redirect))
    }

    /// Grant what the user approved. With `restrict_to_requested` the approval is
    /// first narrowed to what the client actually requested, and the subject and
    /// client come from the challenge instead of the submitted form.
    #[tracing::instrument(
        skip(self, submission),
        fields(challenge = %submission.challenge, client_id = %submission.client_id)
    )]
    pub async fn submit_consent(&self, submission: ConsentSubmission) -> Result<Redirect, FlowError> {
        let ConsentSubmission {
            challenge,
            mut approved_scopes,
            mut approved_audiences,
            mut identifier,
            mut client_id,
        } = submission;

        if self.settings.restrict_to_requested {
            let state = self
                .gateway
                .read_challenge(ChallengeMethod::Consent, &challenge)
                .await?;
            approved_scopes = intersect(&state.requested_scopes, &approved_scopes);
            approved_audiences = intersect(&state.requested_audiences, &approved_audiences);
            if identifier != state.subject || client_id != state.client.id {
                tracing::warn!(
                    submitted_subject = %identifier,
                    submitted_client_id = %client_id,
                    subject = %state.subject,
                    client_id = %state.client.id,
                    "Consent form does not match the challenge, using the challenge"
                );
            }
            identifier = state.subject;
            client_id = state.client.id;
        }

        let resolved = self
            .resolver
            .resolve(&identifier, &client_id, &approved_scopes, &approved_audiences)
            .await?;
        let redirect = self.accept(&challenge, resolved).await?;
        tracing::info!(subject = %identifier, "Consent granted");
        Ok(redirect)
    }

    #[tracing::instrument(skip(self), fields(challenge = %challenge))]
    pub async fn deny_consent(&self, challenge: &ChallengeId) -> Result<Redirect, FlowError> {
        let redirect = self
            .gateway
            .reject(
                ChallengeMethod::Consent,
                challenge,
                Some(RejectReason::access_denied(
                    "The resource owner denied the request",
                )),
            )
            .await?;
        tracing::info!("Consent denied");
        Ok(redirect)
    }

    async fn accept(
        &self,
        challenge: &ChallengeId,
        resolved: ResolvedConsent,
    ) -> Result<Redirect, FlowError> {
        let body = AcceptConsent {
            grant_scope: resolved.grant_scope,
            grant_access_token_audience: resolved.grant_access_token_audience,
            remember: self.settings.remember,
            remember_for: self.settings.remember_for,
            session: resolved.session,
        };
        Ok(self
            .gateway
            .accept(ChallengeMethod::Consent, challenge, AcceptPayload::Consent(body))
            .await?)
    }
}

/// Entries of `requested` that were also approved, in requested order.
fn intersect(requested: &[String], approved: &[String]) -> Vec<String> {
    requested
        .iter()
        .filter(|entry| approved.contains(entry))
        .cloned()
        .collect()
}
