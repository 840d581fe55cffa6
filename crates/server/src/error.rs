use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the authorization server admin API.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error talking to authorization server: {0}")]
    Transport(String),
    #[error("Invalid JSON from authorization server: {0}")]
    Decode(String),
    #[error("Authorization server returned HTTP {status}: {body}")]
    Upstream { status: StatusCode, body: String },
}

impl GatewayError {
    /// The authorization server rejected the request itself (unknown or expired challenge, bad body).
    pub fn is_client_error(&self) -> bool {
        matches!(self, GatewayError::Upstream { status, .. } if status.is_client_error())
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, GatewayError::Upstream { status, .. } if status.is_server_error())
    }
}

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("No user with username or email '{0}'")]
    NotFound(String),
    #[error("User already exists: {0}")]
    Conflict(String),
    #[error("Invalid user: {0}")]
    Invalid(String),
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error("User store backend error: {0}")]
    Backend(#[from] sea_orm::DbErr),
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("User '{0}' not found")]
    UserNotFound(String),
    #[error(transparent)]
    Store(UserStoreError),
}

impl From<UserStoreError> for FlowError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::NotFound(identifier) => FlowError::UserNotFound(identifier),
            other => FlowError::Store(other),
        }
    }
}

impl FlowError {
    /// Request problems are reported before any remote call is made.
    pub fn is_validation(&self) -> bool {
        matches!(self, FlowError::Validation(_))
    }
}
