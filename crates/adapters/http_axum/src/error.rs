//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use habridge_domain::error::BridgeError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`BridgeError`] to an HTTP response with appropriate status code.
pub struct ApiError(BridgeError);

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            BridgeError::Validation(_) => StatusCode::BAD_REQUEST,
            BridgeError::UnknownEntity(_) => StatusCode::NOT_FOUND,
            BridgeError::ReadOnlyEntity(_) => StatusCode::CONFLICT,
            BridgeError::CommandDeliveryFailed(_) => StatusCode::BAD_GATEWAY,
            BridgeError::MaterializationFailed(_)
            | BridgeError::Transport(_)
            | BridgeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            BridgeError::Validation(err) => err.to_string(),
            BridgeError::UnknownEntity(err) => err.to_string(),
            BridgeError::ReadOnlyEntity(err) => err.to_string(),
            BridgeError::CommandDeliveryFailed(err) => {
                tracing::warn!(error = %err, "command delivery failed");
                "command delivery failed".to_string()
            }
            other => {
                tracing::error!(error = %other, "internal error");
                "internal server error".to_string()
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
