use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use crate::errors::AppError;

// The IntoResponse trait implementation converts AppError into a well-formed
// HTTP response. Every error surfaces as a JSON {"message": ...} body;
// internal detail stays in the server log.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),

            AppError::Upload(msg) => (StatusCode::BAD_REQUEST, msg.clone()),

            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),

            // Signature/expiry failures from token verification
            AppError::Token(e) => {
                tracing::warn!("Token verification failed: {}", e);
                (StatusCode::UNAUTHORIZED, "Token failed".to_string())
            }

            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),

            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),

            // Store and library failures are internal server errors; the
            // client gets a generic message, never the raw error text.
            AppError::Redis(e) => {
                tracing::error!("Redis error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
            AppError::Hash(e) => {
                tracing::error!("Password hash error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
            AppError::File(e) => {
                tracing::error!("File error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
            AppError::Export(e) => {
                tracing::error!("Export error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        let cases = [
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::Upload("bad file".into()), StatusCode::BAD_REQUEST),
            (AppError::Auth("no token".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("nope".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (
                AppError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
