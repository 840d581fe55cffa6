//! HTTP client for the authorization server admin API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::challenge::gateway::ChallengeGateway;
use crate::challenge::types::{
    AcceptPayload, Challenge, ChallengeId, ChallengeMethod, Redirect, RejectReason,
};
use crate::config::HydraConfig;
use crate::error::GatewayError;

/// `ChallengeGateway` backed by `/oauth2/auth/requests/{method}` on the admin API.
#[derive(Clone, Debug)]
pub struct HydraClient {
    admin_url: String,
    http: Client,
}

impl HydraClient {
    pub fn new(config: &HydraConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self::with_client(&config.admin_url, http))
    }

    pub fn with_client(admin_url: &str, http: Client) -> Self {
        Self {
            admin_url: admin_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn request_url(&self, method: ChallengeMethod, action: Option<&str>) -> String {
        match action {
            Some(action) => format!(
                "{}/oauth2/auth/requests/{}/{}",
                self.admin_url, method, action
            ),
            None => format!("{}/oauth2/auth/requests/{}", self.admin_url, method),
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::error!(%status, body = %body, "Authorization server rejected request");
            return Err(GatewayError::Upstream { status, body });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChallengeGateway for HydraClient {
    #[tracing::instrument(skip_all, fields(method = %method, challenge = %challenge))]
    async fn read_challenge(
        &self,
        method: ChallengeMethod,
        challenge: &ChallengeId,
    ) -> Result<Challenge, GatewayError> {
        let request = self
            .http
            .get(self.request_url(method, None))
            .query(&[(method.challenge_param(), challenge.as_str())]);
        self.send(request).await
    }

    #[tracing::instrument(skip_all, fields(method = %method, challenge = %challenge))]
    async fn accept(
        &self,
        method: ChallengeMethod,
        challenge: &ChallengeId,
        payload: AcceptPayload,
    ) -> Result<Redirect, GatewayError> {
        let request = self
            .http
            .put(self.request_url(method, Some("accept")))
            .query(&[(method.challenge_param(), challenge.as_str())]);
        let request = match payload {
            AcceptPayload::Login(body) => request.json(&body),
            AcceptPayload::Consent(body) => request.json(&body),
            AcceptPayload::Empty => request,
        };
        self.send(request).await
    }

    #[tracing::instrument(skip_all, fields(method = %method, challenge = %challenge))]
    async fn reject(
        &self,
        method: ChallengeMethod,
        challenge: &ChallengeId,
        reason: Option<RejectReason>,
    ) -> Result<Redirect, GatewayError> {
        let request = self
            .http
            .put(self.request_url(method, Some("reject")))
            .query(&[(method.challenge_param(), challenge.as_str())]);
        let request = match reason {
            Some(reason) => request.json(&reason),
            None => request,
        };
        self.send(request).await
    }
}
