//! Challenge snapshots and decision payloads exchanged with the authorization server.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::FlowError;

/// Which pending decision a challenge belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChallengeMethod {
    Login,
    Consent,
    Logout,
}

impl ChallengeMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ChallengeMethod::Login => "login",
            ChallengeMethod::Consent => "consent",
            ChallengeMethod::Logout => "logout",
        }
    }

    /// Name of the query parameter carrying the challenge, e.g. `login_challenge`.
    pub fn challenge_param(self) -> &'static str {
        match self {
            ChallengeMethod::Login => "login_challenge",
            ChallengeMethod::Consent => "consent_challenge",
            ChallengeMethod::Logout => "logout_challenge",
        }
    }
}

impl fmt::Display for ChallengeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque, single-use identifier of one pending decision.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChallengeId(String);

impl ChallengeId {
    pub fn new(value: impl Into<String>) -> Result<Self, FlowError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(FlowError::Validation("challenge must not be empty".into()));
        }
        Ok(Self(value))
    }

    /// Extract the challenge from a raw query string.
    ///
    /// Exactly one non-empty `{method}_challenge` parameter must be present.
    pub fn from_query(query: Option<&str>, method: ChallengeMethod) -> Result<Self, FlowError> {
        let param = method.challenge_param();
        let mut values = form_urlencoded::parse(query.unwrap_or_default().as_bytes())
            .filter(|(key, _)| key == param)
            .map(|(_, value)| value.into_owned());

        match (values.next(), values.next()) {
            (Some(value), None) => Self::new(value),
            (None, _) => Err(FlowError::Validation(format!(
                "missing {param} query parameter"
            ))),
            (Some(_), Some(_)) => Err(FlowError::Validation(format!(
                "more than one {param} query parameter"
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default, rename = "client_id")]
    pub id: String,
    #[serde(default, rename = "client_name")]
    pub name: String,
}

/// Snapshot of a challenge as reported by the authorization server.
///
/// Fetched once per flow invocation and never cached.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Challenge {
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client: ClientInfo,
    #[serde(default)]
    pub request_url: Option<String>,
    #[serde(
        default,
        rename = "requested_scope",
        deserialize_with = "null_as_default"
    )]
    pub requested_scopes: Vec<String>,
    #[serde(
        default,
        rename = "requested_access_token_audience",
        deserialize_with = "null_as_default"
    )]
    pub requested_audiences: Vec<String>,
    #[serde(default)]
    pub rp_initiated: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Claims embedded in both the access token and the ID token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub email: String,
    pub username: String,
    pub last_name: String,
    pub roles: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentSession {
    pub access_token: SessionClaims,
    pub id_token: SessionClaims,
}

impl ConsentSession {
    /// Both token claim sets are kept identical.
    pub fn symmetric(claims: SessionClaims) -> Self {
        Self {
            access_token: claims.clone(),
            id_token: claims,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptLogin {
    pub subject: String,
    pub remember: bool,
    pub remember_for: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptConsent {
    pub grant_scope: Vec<String>,
    pub grant_access_token_audience: Vec<String>,
    pub remember: bool,
    pub remember_for: u64,
    pub session: ConsentSession,
}

/// Body of an accept decision; the shape depends on the challenge method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AcceptPayload {
    Login(AcceptLogin),
    Consent(AcceptConsent),
    /// Logout accepts carry no body.
    Empty,
}

/// Reason attached to a reject decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectReason {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl RejectReason {
    pub fn access_denied(description: impl Into<String>) -> Self {
        Self {
            error: "access_denied".to_string(),
            error_description: Some(description.into()),
        }
    }
}

/// Where the user agent has to go next.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    #[serde(rename = "redirect_to")]
    pub url: String,
}
