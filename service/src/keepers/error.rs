use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use super::payload::PayloadError;
use super::repo::KeeperRepoError;
use super::validator::{ReferenceViolation, ValidationError};
use crate::zoo_service::{ErrorBody, ZooServiceError};

/// Errors surfaced by keeper operations, each mapped to a JSON error body.
#[derive(Debug, thiserror::Error)]
pub enum KeeperError {
    /// No keeper with this id (or the id is not an integer).
    #[error("zoo keeper: {0} does not exist")]
    BadId(String),

    /// The write payload has the wrong keys or an unparseable value.
    #[error(transparent)]
    BadData(#[from] PayloadError),

    /// The request body is not a JSON object.
    #[error("{0}")]
    BadRequest(String),

    /// A reference does not match the zoo service.
    #[error(transparent)]
    InvalidReference(#[from] ReferenceViolation),

    /// The zoo service could not confirm the references.
    #[error(transparent)]
    ZooService(#[from] ZooServiceError),

    #[error("zoo keeper name already taken: {0}")]
    DuplicateName(String),

    /// No route matches the request path.
    #[error("no route for {0}")]
    NoRoute(String),

    /// The path exists but does not accept this method.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Store failure. The message is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeeperError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadId(_) | Self::NoRoute(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadData(_) | Self::BadRequest(_) | Self::InvalidReference(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::ZooService(err) => err.status_code(),
            Self::DuplicateName(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `{error, title, error_type, text}` body for this error.
    #[must_use]
    pub fn payload(&self) -> Value {
        let status = self.status_code().as_u16();
        match self {
            Self::BadId(_) => ErrorBody::new(status, "not found", "BadId", self.to_string()),
            Self::BadData(_) => ErrorBody::new(status, "bad request", "BadData", self.to_string()),
            Self::BadRequest(_) => {
                ErrorBody::new(status, "bad request", "BadRequest", self.to_string())
            }
            Self::InvalidReference(_) => {
                ErrorBody::new(status, "bad request", "ValueError", self.to_string())
            }
            Self::ZooService(err) => return err.payload(),
            Self::DuplicateName(_) => {
                ErrorBody::new(status, "conflict", "DuplicateName", self.to_string())
            }
            Self::NoRoute(_) => ErrorBody::new(status, "not found", "NotFound", self.to_string()),
            Self::MethodNotAllowed(_) => ErrorBody::new(
                status,
                "method not allowed",
                "MethodNotAllowed",
                self.to_string(),
            ),
            Self::Internal(_) => ErrorBody::new(
                status,
                "internal server error",
                "InternalError",
                "internal server error",
            ),
        }
        .to_value()
    }

    /// Map a repository error for keeper `id` (or the named keeper on writes).
    pub(crate) fn from_repo(err: KeeperRepoError, id: Option<i64>, name: &str) -> Self {
        match err {
            KeeperRepoError::NotFound => {
                Self::BadId(id.map_or_else(|| name.to_string(), |id| id.to_string()))
            }
            KeeperRepoError::DuplicateName => Self::DuplicateName(name.to_string()),
            KeeperRepoError::Database(db_err) => Self::Internal(db_err.to_string()),
        }
    }
}

impl From<ValidationError> for KeeperError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Violation(violation) => Self::InvalidReference(violation),
            ValidationError::Unavailable(remote) => Self::ZooService(remote),
        }
    }
}

impl IntoResponse for KeeperError {
    fn into_response(self) -> Response {
        if let Self::Internal(message) = &self {
            tracing::error!("zoo keeper store failure: {message}");
        }
        (self.status_code(), Json(self.payload())).into_response()
    }
}
