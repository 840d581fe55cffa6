//! Login challenge flow.

use std::sync::Arc;

use crate::challenge::{AcceptLogin, AcceptPayload, ChallengeGateway, ChallengeId, ChallengeMethod};
use crate::config::LoginConfig;
use crate::error::{FlowError, UserStoreError};
use crate::flows::FlowOutcome;
use crate::identity::CredentialVerifier;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginSettings {
    pub remember: bool,
    pub skip_remember_for: u64,
    pub credentials_remember_for: u64,
}

impl From<&LoginConfig> for LoginSettings {
    fn from(config: &LoginConfig) -> Self {
        Self {
            remember: config.remember,
            skip_remember_for: config.skip_remember_for,
            credentials_remember_for: config.credentials_remember_for,
        }
    }
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self::from(&LoginConfig::default())
    }
}

/// The login form must be shown for `challenge`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginPrompt {
    pub challenge: ChallengeId,
    /// Set after a failed credential check.
    pub error: bool,
}

pub type LoginOutcome = FlowOutcome<LoginPrompt>;

#[derive(Clone)]
pub struct LoginFlow {
    gateway: Arc<dyn ChallengeGateway>,
    verifier: Arc<dyn CredentialVerifier>,
    settings: LoginSettings,
}

impl LoginFlow {
    pub fn new(
        gateway: Arc<dyn ChallengeGateway>,
        verifier: Arc<dyn CredentialVerifier>,
        settings: LoginSettings,
    ) -> Self {
        Self {
            gateway,
            verifier,
            settings,
        }
    }

    /// Accept right away when the authorization server already knows the user,
    /// otherwise ask for credentials.
    #[tracing::instrument(skip(self), fields(challenge = %challenge))]
    pub async fn begin_login(&self, challenge: &ChallengeId) -> Result<LoginOutcome, FlowError> {
        let state = self
            .gateway
            .read_challenge(ChallengeMethod::Login, challenge)
            .await?;

        if !state.skip {
            return Ok(FlowOutcome::Prompt(LoginPrompt {
                challenge: challenge.clone(),
                error: false,
            }));
        }

        let body = AcceptLogin {
            subject: state.subject,
            remember: self.settings.remember,
            remember_for: self.settings.skip_remember_for,
        };
        tracing::info!(subject = %body.subject, "Login skipped, accepting existing session");
        let redirect = self
            .gateway
            .accept(ChallengeMethod::Login, challenge, AcceptPayload::Login(body))
            .await?;
        Ok(FlowOutcome::Redirect(redirect))
    }

    /// Check submitted credentials and accept the challenge with `username` as subject.
    ///
    /// Wrong passwords and unknown users re-prompt with the error flag set; the
    /// challenge stays open upstream.
    #[tracing::instrument(skip(self, password), fields(challenge = %challenge))]
    pub async fn submit_login(
        &self,
        challenge: &ChallengeId,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, FlowError> {
        let verified = match self.verifier.verify(username, password).await {
            Ok(verified) => verified,
            Err(UserStoreError::NotFound(_)) => false,
            Err(e) => {
                tracing::error!(error = %e, "Credential check failed");
                return Err(FlowError::Store(e));
            }
        };

        if !verified {
            tracing::warn!("Rejected credentials");
            return Ok(FlowOutcome::Prompt(LoginPrompt {
                challenge: challenge.clone(),
                error: true,
            }));
        }

        let body = AcceptLogin {
            subject: username.to_string(),
            remember: self.settings.remember,
            remember_for: self.settings.credentials_remember_for,
        };
        let redirect = self
            .gateway
            .accept(ChallengeMethod::Login, challenge, AcceptPayload::Login(body))
            .await?;
        tracing::info!("Login accepted");
        Ok(FlowOutcome::Redirect(redirect))
    }
}
