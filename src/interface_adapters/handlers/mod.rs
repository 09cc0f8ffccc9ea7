use axum::http::StatusCode;
use axum::Json;

use crate::interface_adapters::protocol::ErrorResponse;

pub mod admin;
pub mod session;
pub mod submissions;

// Helper to build a JSON error response.
pub(crate) fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            message: message.to_string(),
        }),
    )
}
