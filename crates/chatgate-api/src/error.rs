use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use chatgate_types::api::ErrorResponse;

use crate::provider::ProviderError;
use crate::verifier::AuthFailure;

/// Every way a gateway request can fail, mapped to HTTP in one place.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(AuthFailure::MissingToken) | Self::Auth(AuthFailure::InvalidOrExpired(_)) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Auth(AuthFailure::ServiceUnavailable(_))
            | Self::Auth(AuthFailure::MalformedResponse(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::EmptyMessage | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Provider(_) | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Auth(AuthFailure::InvalidOrExpired(_)) => "Invalid or expired token".to_string(),
            Self::Auth(AuthFailure::ServiceUnavailable(_))
            | Self::Auth(AuthFailure::MalformedResponse(_)) => {
                "Auth service unavailable".to_string()
            }
            // Database details stay in the log
            Self::Storage(_) => "storage error".to_string(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            error!("{} -> {}", self, status);
        } else {
            warn!("{} -> {}", self, status);
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
