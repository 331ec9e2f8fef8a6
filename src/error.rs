use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorBody;

/// Failures talking to one of the hosted AI services.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Request failed: {0}")]
    Transport(reqwest::Error),

    #[error("{service} API Error: {message}")]
    Status {
        service: &'static str,
        status: StatusCode,
        message: String,
    },

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

// reqwest errors print the request URL, which may carry credentials
impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        UpstreamError::Transport(e.without_url())
    }
}

/// Errors surfaced at the edge of a handler, rendered as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    MissingCredentials(&'static str),

    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("No captions generated or parsed from response")]
    NoCaptions,

    #[error("Failed to encode metrics: {0}")]
    Metrics(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingCredentials(_)
            | ApiError::Upstream(_)
            | ApiError::NoCaptions
            | ApiError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Keeps the status but replaces the message, for routes that hide error details.
    pub fn into_response_with(self, message: &str) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            ApiError::InvalidRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MissingCredentials("API key not configured").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::NoCaptions.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upstream_status_message_names_the_service() {
        let err = ApiError::from(UpstreamError::Status {
            service: "Gemini",
            status: StatusCode::FORBIDDEN,
            message: "API key not valid".to_string(),
        });
        assert_eq!(err.to_string(), "Gemini API Error: API key not valid");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
