//! Wire types shared by the zoo service client and the keeper API.

use serde::{Deserialize, Serialize};

/// Error payload exchanged with (and mirrored from) the zoo service.
///
/// Both remote error bodies and locally raised errors use this shape, so a
/// remote failure can be embedded in a keeper view without translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// HTTP status code associated with the error
    pub error: u16,
    /// Short human-readable summary (e.g. "gateway timeout")
    pub title: String,
    /// Error kind (e.g. "NoResponse", "BadId")
    pub error_type: String,
    /// Occurrence-specific detail
    pub text: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(
        error: u16,
        title: impl Into<String>,
        error_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            error,
            title: title.into(),
            error_type: error_type.into(),
            text: text.into(),
        }
    }

    /// Payload raised when the zoo service could not be reached.
    #[must_use]
    pub fn no_response(text: impl Into<String>) -> Self {
        Self::new(504, "gateway timeout", "NoResponse", text)
    }

    /// Convert to a JSON value for embedding in a response body.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.error,
            "title": self.title,
            "error_type": self.error_type,
            "text": self.text,
        })
    }
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({}): {}", self.error, self.title, self.error_type, self.text)
    }
}

/// The part of a remote monkey snapshot this service interprets.
///
/// Everything else in the snapshot is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonkeyRef {
    pub id: Option<i64>,
    #[serde(default)]
    pub zoo_id: Option<i64>,
}
