use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::messages::anthropic;

pub type LlmResult<T> = std::result::Result<T, LlmError>;

/// Proxy errors with appropriate HTTP status codes.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing or invalid request fields.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or invalid proxy key.
    #[error("Unauthorized")]
    Unauthorized,

    /// The upstream returned a non-2xx status.
    /// The original status is preserved when it is in the 4xx-5xx range.
    #[error("Upstream error ({status}): {message}")]
    UpstreamApi {
        status: u16,
        message: String,
        /// Raw upstream body, exposed on the OpenAI-shaped endpoints.
        body: Option<String>,
    },

    /// The upstream returned 2xx but neither SSE nor a parseable chat
    /// completion.
    #[error("Unexpected upstream response: {0}")]
    UpstreamShape(String),

    /// Socket or read failure talking to the upstream.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Everything else.
    /// If Some(message), it is safe to show to the caller.
    #[error("Internal server error")]
    Internal(Option<String>),
}

impl LlmError {
    /// Get the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            // Preserve upstream statuses in the 4xx-5xx range, anything else
            // becomes 502.
            Self::UpstreamApi { status, .. } => match StatusCode::from_u16(*status) {
                Ok(code) if code.is_client_error() || code.is_server_error() => code,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::UpstreamShape(_) | Self::Connection(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string for the response body.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::Unauthorized => "authentication_error",
            Self::UpstreamApi { .. } | Self::UpstreamShape(_) | Self::Connection(_) => "api_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Message that is safe to expose to API consumers.
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(Some(message)) => message.clone(),
            Self::Internal(None) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Error response format compatible with the OpenAI API.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    message: String,
    r#type: &'static str,
    code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_body: Option<String>,
}

impl IntoResponse for LlmError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.client_message();
        let error_type = self.error_type();

        let upstream_body = match self {
            Self::UpstreamApi { body, .. } => body,
            _ => None,
        };

        let error_response = ErrorResponse {
            error: ErrorDetails {
                message,
                r#type: error_type,
                code: status.as_u16(),
                upstream_body,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

pub struct AnthropicErrorResponse {
    status: StatusCode,
    body: anthropic::ErrorResponse,
}

impl From<LlmError> for AnthropicErrorResponse {
    fn from(error: LlmError) -> Self {
        let status = error.status_code();
        let body = anthropic::ErrorResponse::new(error.error_type(), error.client_message());

        Self { status, body }
    }
}

impl IntoResponse for AnthropicErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub type AnthropicResult<T> = std::result::Result<T, AnthropicErrorResponse>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_is_preserved_in_range() {
        let error = LlmError::UpstreamApi {
            status: 429,
            message: "slow down".to_string(),
            body: None,
        };
        assert_eq!(error.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn out_of_range_upstream_status_maps_to_bad_gateway() {
        let error = LlmError::UpstreamApi {
            status: 302,
            message: "redirected".to_string(),
            body: None,
        };
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn shape_errors_are_bad_gateway() {
        let error = LlmError::UpstreamShape("not json".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(error.error_type(), "api_error");
    }

    #[test]
    fn internal_errors_hide_details_by_default() {
        assert_eq!(LlmError::Internal(None).client_message(), "Internal server error");
        assert_eq!(
            LlmError::Internal(Some("upstream said no".to_string())).client_message(),
            "upstream said no"
        );
    }
}
