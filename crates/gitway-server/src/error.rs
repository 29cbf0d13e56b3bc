//! Gateway error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Errors a handler can surface to the client.
///
/// Bodies are deliberately generic: a denial or a miss must not reveal
/// whether the repository exists.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Unmatched route, missing repository, or missing file.
    #[error("not found")]
    NotFound,

    /// Wrong verb on a matched route. Legacy pre-HTTP/1.1 clients get 400.
    #[error("method not allowed")]
    MethodNotAllowed { legacy: bool },

    /// Access gate denial.
    #[error("forbidden")]
    Forbidden,

    /// Spawn or pipe failure before any response bytes were written.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            GatewayError::NotFound => (StatusCode::NOT_FOUND, "Not Found"),
            GatewayError::MethodNotAllowed { legacy: false } => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
            },
            GatewayError::MethodNotAllowed { legacy: true } => {
                (StatusCode::BAD_REQUEST, "Bad Request")
            },
            GatewayError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            GatewayError::Internal(message) => {
                tracing::error!(error = %message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            },
        };

        (status, body).into_response()
    }
}
