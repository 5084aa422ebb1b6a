use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Why the gate refused a request.
///
/// Every variant maps to a fixed client message; internal causes (which
/// cryptographic check failed, and so on) are never part of the response.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    #[error("Missing or invalid Authorization header")]
    MissingOrMalformedAuthHeader,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("ADMIN role required")]
    InsufficientRole,
}

impl AuthRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthRejection::MissingOrMalformedAuthHeader | AuthRejection::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthRejection::InsufficientRole => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        json_message(self.status(), self.to_string())
    }
}

/// Failure body shared by every gateway error: `{"message": "..."}`.
///
/// The response is a value returned once from the handler stack, so it can
/// only ever be written to a response that has not started yet.
pub fn json_message(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "message": message.into(),
        })),
    )
        .into_response()
}
