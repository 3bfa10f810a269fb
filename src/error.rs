//! API error type and its mapping to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;
use crate::validate::FieldErrors;

// ---

#[derive(Debug, Error)]
pub enum ApiError {
    // ---
    /// Body is not a JSON object, or was not sent as JSON.
    #[error("Request must be JSON")]
    MalformedRequest,

    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(FieldErrors),

    /// Anything unexpected. Details go to the log, never to the client.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        match self {
            ApiError::MalformedRequest => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Request must be JSON" })),
            )
                .into_response(),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": errors })),
            )
                .into_response(),
            ApiError::Internal(err) => {
                error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
