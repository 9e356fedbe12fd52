// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::feed::FeedError;
use crate::images::ImageError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "reason": self.message(),
            "code": self.error_code()
        })
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Conflict(msg) => ApiError::conflict(msg),
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Database misconfigured: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut) => {
                tracing::error!("Database pool timed out");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential
            | AuthError::MalformedCredential(_)
            | AuthError::InvalidCredential(_)
            | AuthError::UnknownUser(_) => ApiError::unauthorized(err.to_string()),
            AuthError::TokenGeneration(msg) => {
                tracing::error!("Token generation failed: {}", msg);
                ApiError::internal_server_error("Failed to issue access token")
            }
            AuthError::Storage(db_err) => db_err.into(),
        }
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::Storage(db_err) => {
                tracing::error!("Feed read failed: {}", db_err);
                ApiError::internal_server_error("Failed to load the listing feed")
            }
        }
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Encode(_) | ImageError::GenerationExhausted(_) => {
                tracing::error!("Image generation failed: {}", err);
                ApiError::internal_server_error(err.to_string())
            }
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!("Blocking task failed: {}", err);
        ApiError::internal_server_error("An error occurred while processing your request")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_body_carries_reason() {
        let err = ApiError::unauthorized("invalid credential: ExpiredSignature");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            err.to_json(),
            json!({ "reason": "invalid credential: ExpiredSignature", "code": "UNAUTHORIZED" })
        );
    }

    #[test]
    fn storage_errors_are_not_leaked() {
        let err: ApiError =
            DatabaseError::Sqlx(sqlx::Error::Protocol("relation \"cards\" does not exist".into())).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message().contains("cards"));
    }

    #[test]
    fn feed_storage_failure_is_internal() {
        let storage = DatabaseError::Sqlx(sqlx::Error::Protocol("boom".into()));
        let err: ApiError = FeedError::Storage(storage).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn credential_failures_map_to_unauthorized() {
        for err in [
            AuthError::MissingCredential,
            AuthError::InvalidCredential("bad signature".into()),
            AuthError::UnknownUser("ghost".into()),
        ] {
            let api: ApiError = err.into();
            assert_eq!(api.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn image_rule_violations_are_bad_requests() {
        let api: ApiError = ImageError::Empty.into();
        assert_eq!(api.status_code(), StatusCode::BAD_REQUEST);
        let api: ApiError = ImageError::GenerationExhausted(10).into();
        assert_eq!(api.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
