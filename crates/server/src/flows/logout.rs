//! Logout challenge flow.

use std::sync::Arc;

use crate::challenge::{AcceptPayload, ChallengeGateway, ChallengeId, ChallengeMethod, Redirect};
use crate::error::FlowError;
use crate::flows::FlowOutcome;

/// Logout confirmation for a relying-party initiated logout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogoutPrompt {
    pub challenge: ChallengeId,
    pub subject: String,
}

pub type LogoutOutcome = FlowOutcome<LogoutPrompt>;

#[derive(Clone)]
pub struct LogoutFlow {
    gateway: Arc<dyn ChallengeGateway>,
}

impl LogoutFlow {
    pub fn new(gateway: Arc<dyn ChallengeGateway>) -> Self {
        Self { gateway }
    }

    /// Only relying-party initiated logouts ask the user; everything else is accepted.
    #[tracing::instrument(skip(self), fields(challenge = %challenge))]
    pub async fn begin_logout(&self, challenge: &ChallengeId) -> Result<LogoutOutcome, FlowError> {
        let state = self
            .gateway
            .read_challenge(ChallengeMethod::Logout, challenge)
            .await?;

        if state.rp_initiated {
            return Ok(FlowOutcome::Prompt(LogoutPrompt {
                challenge: challenge.clone(),
                subject: state.subject,
            }));
        }

        let redirect = self
            .gateway
            .accept(ChallengeMethod::Logout, challenge, AcceptPayload::Empty)
            .await?;
        tracing::info!(subject = %state.subject, "Logout accepted");
        Ok(FlowOutcome::Redirect(redirect))
    }

    #[tracing::instrument(skip(self), fields(challenge = %challenge))]
    pub async fn submit_logout(
        &self,
        challenge: &ChallengeId,
        accepted: bool,
    ) -> Result<Redirect, FlowError> {
        let redirect = if accepted {
            self.gateway
                .accept(ChallengeMethod::Logout, challenge, AcceptPayload::Empty)
                .await?
        } else {
            self.gateway
                .reject(ChallengeMethod::Logout, challenge, None)
                .await?
        };
        tracing::info!(accepted, "Logout decision recorded");
        Ok(redirect)
    }
}
