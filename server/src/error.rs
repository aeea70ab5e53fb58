use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::StoreError;

/// Failure at the HTTP boundary.
///
/// Every variant renders as `500 {"error": "<message>"}` so clients see one
/// error shape regardless of where the request failed.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request body was not valid JSON for the operation.
    #[error("{0}")]
    Payload(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Payload(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match &self {
            AppError::Store(err) => tracing::error!(error = %err, "Todo store failed"),
            AppError::Payload(msg) => tracing::warn!(error = %msg, "Rejected request body"),
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": message })),
        )
            .into_response()
    }
}
