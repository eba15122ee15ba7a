//! Wire errors for the HTTP API.
//!
//! Every failure leaves the API as `{"error": "<code>", "message": "<text>"}`
//! with a stable status code. Internal failures are logged in full and
//! answered with a generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::checkin::CheckInError;
use crate::deployment::StatusError;
use crate::pagination::PaginationError;
use crate::storage::DatabaseError;

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed input: pagination, filters, ids, enum values, missing fields.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The id or filter does not resolve, or nothing was updated/deleted.
    #[error("resource not found")]
    NotFound,

    /// A referenced parent does not exist.
    #[error("referenced resource does not exist")]
    InvalidReference,

    /// A uniqueness constraint was violated.
    #[error("resource already exists")]
    Conflict,

    /// Check-in authentication failed, for whatever reason.
    #[error("invalid or missing authentication")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for handler return values.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidReference => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::NotFound => "not_found",
            Self::InvalidReference => "invalid_reference",
            Self::Conflict => "conflict",
            Self::Unauthorized => "unauthorized",
            Self::Internal(_) => "internal_error",
        }
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(_) => Self::NotFound,
            DatabaseError::ForeignKey(_) => Self::InvalidReference,
            DatabaseError::UniqueViolation(_) => Self::Conflict,
            DatabaseError::ConstraintViolation(_) => {
                Self::invalid_request("value violates a field constraint")
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<PaginationError> for ApiError {
    fn from(e: PaginationError) -> Self {
        Self::InvalidRequest(e.to_string())
    }
}

impl From<StatusError> for ApiError {
    fn from(e: StatusError) -> Self {
        Self::InvalidRequest(e.to_string())
    }
}

impl From<CheckInError> for ApiError {
    fn from(e: CheckInError) -> Self {
        match e {
            CheckInError::Unauthorized(reason) => {
                debug!(%reason, "Check-in authentication failed");
                Self::Unauthorized
            }
            CheckInError::Database(db) => db.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            error!(error = %self, "Request failed");
        } else {
            debug!(error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_map_to_taxonomy() {
        assert!(matches!(
            ApiError::from(DatabaseError::NotFound("x".into())),
            ApiError::NotFound
        ));
        assert!(matches!(
            ApiError::from(DatabaseError::ForeignKey("x".into())),
            ApiError::InvalidReference
        ));
        assert!(matches!(
            ApiError::from(DatabaseError::UniqueViolation("x".into())),
            ApiError::Conflict
        ));
        assert!(matches!(
            ApiError::from(DatabaseError::ConstraintViolation("x".into())),
            ApiError::InvalidRequest(_)
        ));
        assert!(ApiError::from(DatabaseError::Query("boom".into())).is_internal());
        assert!(ApiError::from(DatabaseError::ReadOnly("create_site")).is_internal());
    }

    #[test]
    fn status_codes_are_stable() {
        assert_eq!(ApiError::invalid_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidReference.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = ApiError::Internal("disk I/O error at /var/lib/fleet.db".into());
        assert_eq!(err.public_message(), "internal server error");
        assert_eq!(err.code(), "internal_error");
    }

    #[test]
    fn every_auth_failure_looks_the_same() {
        use crate::auth::AuthError;
        for reason in [
            AuthError::MissingHeader,
            AuthError::InvalidEncoding,
            AuthError::UnknownNode,
        ] {
            let err = ApiError::from(CheckInError::Unauthorized(reason));
            assert!(matches!(err, ApiError::Unauthorized));
            assert_eq!(err.public_message(), "invalid or missing authentication");
        }
    }
}
