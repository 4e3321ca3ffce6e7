use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{error, warn};
use serde::Serialize;
use thiserror::Error;

use crate::config::RelayMode;

/// Failures the relay answers with a fixed response instead of an upstream one.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing Seqera token")]
    MissingApiToken,

    #[error("Missing token")]
    MissingImageToken,

    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    /// Transport failure talking to the upstream API.
    #[error("{message}")]
    Upstream {
        message: String,
        detail: Option<String>,
    },

    #[error("Image fetch failed")]
    ImageFetchFailed(StatusCode),

    #[error("Image proxy error: {0}")]
    ImageProxy(String),
}

impl RelayError {
    /// Wraps a transport error; the full source chain is only exposed in development.
    pub fn upstream(err: &(dyn StdError + 'static), mode: RelayMode) -> Self {
        let detail = match mode {
            RelayMode::Development => Some(error_chain(err)),
            RelayMode::Production => None,
        };
        Self::Upstream {
            message: err.to_string(),
            detail,
        }
    }
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain.join("\n  caused by: ")
}

/// JSON error body of the API passthrough.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        match self {
            RelayError::MissingApiToken => {
                warn!("Rejected API request: {message}");
                json_error(StatusCode::UNAUTHORIZED, message, None)
            }
            RelayError::MissingImageToken => {
                warn!("Rejected image request: {message}");
                (StatusCode::UNAUTHORIZED, message).into_response()
            }
            RelayError::InvalidBody(_) => {
                warn!("Rejected API request: {message}");
                json_error(StatusCode::BAD_REQUEST, message, None)
            }
            RelayError::Upstream { message, detail } => {
                error!("Proxy error: {}", detail.as_deref().unwrap_or(&message));
                json_error(StatusCode::INTERNAL_SERVER_ERROR, message, detail)
            }
            RelayError::ImageFetchFailed(status) => (status, message).into_response(),
            RelayError::ImageProxy(cause) => {
                error!("Image proxy error: {cause}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Image proxy error").into_response()
            }
        }
    }
}

fn json_error(status: StatusCode, error: String, detail: Option<String>) -> Response {
    (status, Json(ErrorBody { error, detail })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[derive(Debug, Error)]
    #[error("outer failure")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_upstream_detail_only_in_development() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "connection reset"));

        match RelayError::upstream(&err, RelayMode::Development) {
            RelayError::Upstream { message, detail } => {
                assert_eq!(message, "outer failure");
                assert_eq!(
                    detail.as_deref(),
                    Some("outer failure\n  caused by: connection reset")
                );
            }
            other => panic!("unexpected variant: {other:?}"),
        }

        assert!(matches!(
            RelayError::upstream(&err, RelayMode::Production),
            RelayError::Upstream { detail: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_api_token_body() {
        let response = RelayError::MissingApiToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"error": "Missing Seqera token"}));
    }

    #[tokio::test]
    async fn test_image_errors_are_plain_text() {
        let response = RelayError::ImageProxy("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Image proxy error");

        let response = RelayError::ImageFetchFailed(StatusCode::NOT_FOUND).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Image fetch failed");
    }
}
