use crate::store::StoreError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// A custom error type for the server application.
///
/// This enum encapsulates the errors a handler can hit, allowing them to be
/// converted into appropriate HTTP responses.
pub enum AppError {
    /// The request body could not be read as the expected payload.
    BadRequest(String),
    /// Errors from the cover store.
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::BadRequest(msg) => {
                warn!("Rejected malformed request: {msg}");
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::Store(err) => {
                error!("StoreError: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Cover store failure: {err}"),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
