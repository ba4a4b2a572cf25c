//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use relayforge_types::error::BuildError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Build pipeline and lookup errors.
    Build(BuildError),
    /// Generic internal error.
    Internal(String),
}

impl From<BuildError> for AppError {
    fn from(e: BuildError) -> Self {
        AppError::Build(e)
    }
}

/// HTTP status for a build error.
pub fn status_for(error: &BuildError) -> StatusCode {
    match error {
        BuildError::BadRequest(_)
        | BuildError::OutOfRange(_)
        | BuildError::UnrecognizedFormat(_)
        | BuildError::Customizer(_)
        | BuildError::GatewayResponse(_) => StatusCode::BAD_REQUEST,
        BuildError::NotFound(_) => StatusCode::NOT_FOUND,
        BuildError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
        BuildError::InvalidGateway(_) => StatusCode::GONE,
        BuildError::MissingParent(_) | BuildError::Unknown(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for(error: &BuildError) -> String {
    match error {
        BuildError::InvalidGateway(msg) => {
            format!("Failed to add build, because {msg}. Try restarting gateway.")
        }
        other => other.to_string(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Build(e) => (status_for(e), e.code(), message_for(e)),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        } else {
            tracing::debug!(code, %message, "request rejected");
        }

        let body = ApiResponse::<()>::error(code, &message, uuid::Uuid::now_v7().to_string(), 0);
        let body = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"errors":[{"code":"SERIALIZATION_ERROR","message":"Failed to serialize response"}]}"#.to_string()
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}
