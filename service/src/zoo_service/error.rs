use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use super::types::ErrorBody;

/// Errors raised while talking to the zoo service.
#[derive(Debug, Clone, Error)]
pub enum ZooServiceError {
    /// The remote timed out on every attempt or could not be reached.
    #[error("no response from zoo service: {0}")]
    NoResponse(ErrorBody),

    /// The remote answered with a non-2xx status (or an unreadable body).
    /// Carries the remote error body verbatim.
    #[error("bad response from zoo service: {0}")]
    BadResponse(Value),
}

impl ZooServiceError {
    /// The JSON payload to embed in, or return as, a response body.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::NoResponse(body) => body.to_value(),
            Self::BadResponse(body) => body.clone(),
        }
    }

    /// Status to use when this error becomes the whole response.
    ///
    /// `NoResponse` is always a gateway timeout. A remote error keeps the
    /// status it advertised in its `error` field when that is a 4xx/5xx code.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoResponse(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::BadResponse(body) => body
                .get("error")
                .and_then(Value::as_u64)
                .and_then(|code| u16::try_from(code).ok())
                .and_then(|code| StatusCode::from_u16(code).ok())
                .filter(|status| status.is_client_error() || status.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
        }
    }
}
