//! Application error taxonomy shared by use cases and HTTP handlers

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warp::http::StatusCode;

/// Category of an application error; each maps to one HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    Internal,
    ServiceUnavailable,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Error returned by use cases and rendered by the HTTP layer
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<String>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    // Canned errors

    pub fn invalid_credentials() -> Self {
        Self::unauthorized("Invalid credentials")
    }

    pub fn token_expired() -> Self {
        Self::unauthorized("Token expired")
    }

    pub fn invalid_token() -> Self {
        Self::unauthorized("Invalid token")
    }

    pub fn user_not_found() -> Self {
        Self::not_found("User not found")
    }

    pub fn email_exists() -> Self {
        Self::conflict("Email already exists")
    }

    pub fn invalid_input() -> Self {
        Self::bad_request("Invalid input")
    }

    pub fn database_error() -> Self {
        Self::internal("Database error occurred")
    }

    pub fn external_service_unavailable() -> Self {
        Self::service_unavailable("External service unavailable")
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// JSON body sent to clients
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.message.clone(),
            code: self.status().as_u16(),
            details: self.details.clone(),
        }
    }

    /// Render as a warp reply carrying the matching status
    pub fn to_reply(&self) -> warp::reply::WithStatus<warp::reply::Json> {
        warp::reply::with_status(warp::reply::json(&self.body()), self.status())
    }
}

impl warp::reject::Reject for AppError {}

/// Wire format of an error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::invalid_token().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::user_not_found().status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::email_exists().status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::database_error().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::external_service_unavailable().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_body_omits_missing_details() {
        let json = serde_json::to_value(AppError::token_expired().body()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "Token expired", "code": 401})
        );
    }

    #[test]
    fn test_body_with_details() {
        let err = AppError::internal("Failed to send email").with_details("resend returned 422");
        let body = err.body();
        assert_eq!(body.code, 500);
        assert_eq!(body.details.as_deref(), Some("resend returned 422"));
        assert_eq!(err.to_string(), "Failed to send email");
    }
}
