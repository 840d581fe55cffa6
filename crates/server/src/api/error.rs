//! HTTP mapping for flow failures.

use axum::{
    Json,
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::FlowError;

/// JSON error body returned when a flow cannot continue.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code (`invalid_request`, `bad_gateway`, `server_error`)
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl ApiError {
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self {
            error: "invalid_request".to_string(),
            error_description: Some(description.into()),
        }
    }

    pub fn bad_gateway(description: impl Into<String>) -> Self {
        Self {
            error: "bad_gateway".to_string(),
            error_description: Some(description.into()),
        }
    }

    pub fn server_error() -> Self {
        Self {
            error: "server_error".to_string(),
            error_description: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "invalid_request" => StatusCode::BAD_REQUEST,
            "bad_gateway" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::Validation(message) => ApiError::invalid_request(message),
            FlowError::Gateway(e) => {
                tracing::error!(error = %e, "Authorization server call failed");
                ApiError::bad_gateway("The authorization server request failed")
            }
            other => {
                tracing::error!(error = %other, "Flow failed");
                ApiError::server_error()
            }
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::invalid_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GatewayError, UserStoreError};

    #[test]
    fn flow_errors_map_to_status_codes() {
        let response = ApiError::from(FlowError::Validation("missing".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::from(FlowError::Gateway(GatewayError::Upstream {
            status: reqwest::StatusCode::NOT_FOUND,
            body: "{}".into(),
        }))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = ApiError::from(FlowError::UserNotFound("ghost".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ApiError::from(FlowError::Store(UserStoreError::Hash("salt".into())))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn gateway_errors_hide_upstream_body() {
        let error = ApiError::from(FlowError::Gateway(GatewayError::Upstream {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: "internal dsn=postgres://hydra:secret@db".into(),
        }));
        assert_eq!(error.error, "bad_gateway");
        let description = error.error_description.unwrap_or_default();
        assert_eq!(description, "The authorization server request failed");
        assert!(!description.contains("secret"));
    }

    #[test]
    fn server_errors_hide_details() {
        let error = ApiError::from(FlowError::UserNotFound("ghost".into()));
        assert_eq!(error.error, "server_error");
        assert!(error.error_description.is_none());
    }
}
