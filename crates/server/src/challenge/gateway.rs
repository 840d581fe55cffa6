use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::challenge::types::{
    AcceptPayload, Challenge, ChallengeId, ChallengeMethod, Redirect, RejectReason,
};
use crate::error::GatewayError;

/// Remote side of every flow: reads challenges and records decisions.
///
/// Any error is fatal for the current request. A failed `accept`/`reject` leaves
/// the challenge in an unknown upstream state; callers must not retry it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChallengeGateway: Send + Sync {
    async fn read_challenge(
        &self,
        method: ChallengeMethod,
        challenge: &ChallengeId,
    ) -> Result<Challenge, GatewayError>;

    async fn accept(
        &self,
        method: ChallengeMethod,
        challenge: &ChallengeId,
        payload: AcceptPayload,
    ) -> Result<Redirect, GatewayError>;

    async fn reject(
        &self,
        method: ChallengeMethod,
        challenge: &ChallengeId,
        reason: Option<RejectReason>,
    ) -> Result<Redirect, GatewayError>;
}
