//! Error taxonomy shared by every service.
//!
//! Errors carry a short human message plus an optional wrapped cause.
//! Only the top-level message is ever exposed to external callers; the
//! full cause chain is for logs (`ServiceError::log_chain`).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Unknown,

    /// Internal fault in this service.
    Service,
    /// A dependency (database, bus, peer service) misbehaved.
    ExtService,

    NotFound,
    AlreadyExists,

    Forbidden,
    Unauthorised,

    InvalidArgument,
}

impl ErrorCode {
    /// Maps the service error codes to their wire status equivalents.
    pub fn http_status(self) -> StatusCode {
        match self {
            ErrorCode::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Service => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ExtService => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyExists => StatusCode::CONFLICT,
            ErrorCode::Forbidden | ErrorCode::Unauthorised => StatusCode::FORBIDDEN,
            ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct ServiceError {
    code: ErrorCode,
    msg: String,
    #[source]
    wrapped: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ServiceError {
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            wrapped: None,
        }
    }

    pub fn wrap(
        code: ErrorCode,
        msg: impl Into<String>,
        wrapped: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            msg: msg.into(),
            wrapped: Some(Box::new(wrapped)),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The message that may be shown to external callers.
    pub fn public_message(&self) -> &str {
        &self.msg
    }

    /// Full "msg: cause: cause" chain for logging. Never sent on the wire.
    pub fn log_chain(&self) -> String {
        let mut out = self.msg.clone();
        if let Some(wrapped) = &self.wrapped {
            let mut current: &dyn std::error::Error = wrapped.as_ref();
            loop {
                out.push_str(": ");
                out.push_str(&current.to_string());
                match current.source() {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }
        out
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.code.http_status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self.log_chain());
        }
        let body = Json(ErrorResponse {
            error: self.msg,
        });
        (status, body).into_response()
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::wrap(ErrorCode::Service, "serialization failure", err)
    }
}

impl From<diesel::result::Error> for ServiceError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        let (code, msg) = match &err {
            Error::NotFound => (ErrorCode::NotFound, "record not found"),
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                (ErrorCode::AlreadyExists, "record already exists")
            }
            _ => (ErrorCode::ExtService, "database error"),
        };
        ServiceError::wrap(code, msg, err)
    }
}

impl From<diesel_async::pooled_connection::bb8::RunError> for ServiceError {
    fn from(err: diesel_async::pooled_connection::bb8::RunError) -> Self {
        ServiceError::wrap(ErrorCode::ExtService, "failed to acquire database connection", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_status_mapping() {
        assert_eq!(ErrorCode::Service.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorCode::ExtService.http_status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::AlreadyExists.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::Forbidden.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::Unauthorised.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::InvalidArgument.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Unknown.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn wrapped_cause_stays_out_of_public_message() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "connection refused");
        let err = ServiceError::wrap(ErrorCode::ExtService, "failed to reach database", io);

        assert_eq!(err.public_message(), "failed to reach database");
        assert_eq!(err.to_string(), "failed to reach database");
        assert_eq!(err.log_chain(), "failed to reach database: connection refused");
    }
}
