//! Error types for the PlayPath API client.
//!
//! # Design
//! Failures the API reports land in [`ApiError`], tagged with an
//! [`ApiErrorKind`] and carrying the status code and raw body. Authentication
//! failures get their own variant because they are also raised locally, before
//! any request, when no key is configured. `UnsupportedMethod` is a caller
//! contract violation and deliberately sits outside the API hierarchy.

use serde_json::Value;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the client.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable key was configured, or the API answered 401.
    #[error("{message}")]
    Authentication {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    /// The API answered with a failure status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The caller asked for a method outside GET/POST/PATCH/PUT/DELETE.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Base URL and path did not compose to an absolute URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A success response body was not valid JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl Error {
    pub(crate) fn missing_key() -> Self {
        Error::Authentication {
            message: "API key not configured".to_string(),
            status: None,
            body: None,
        }
    }

    /// HTTP status behind this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Authentication { status, .. } => *status,
            Error::Api(e) => Some(e.status),
            _ => None,
        }
    }

    /// Raw response body behind this error, if it came from a response.
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Authentication { body, .. } => body.as_deref(),
            Error::Api(e) => Some(&e.body),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Api(e) => Some(e.kind),
            _ => None,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(ApiErrorKind::NotFound)
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == Some(ApiErrorKind::Validation)
    }

    pub fn is_trial_limit(&self) -> bool {
        self.kind() == Some(ApiErrorKind::TrialLimit)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind() == Some(ApiErrorKind::RateLimit)
    }
}

/// Specialization of an API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Any failure status without a dedicated kind, including 403 "Forbidden".
    Generic,
    /// 400 or 422.
    Validation,
    /// 403 whose message mentions the trial limit.
    TrialLimit,
    /// 404.
    NotFound,
    /// 429.
    RateLimit,
    /// 502, an upstream service of the API failed.
    ExternalService,
}

/// A failure reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: u16,
    pub message: String,
    /// Undecoded response body, kept for diagnostics.
    pub body: String,
}

impl ApiError {
    pub fn new(
        kind: ApiErrorKind,
        status: u16,
        message: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            body: body.into(),
        }
    }
}

/// Error response body, decoded leniently.
///
/// A body that is not a JSON object is kept as raw text instead of failing,
/// so the HTTP failure is never masked by a secondary parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorBody {
    Parsed {
        message: Option<String>,
        errors: Option<Vec<String>>,
    },
    Raw(String),
    Empty,
}

impl ErrorBody {
    pub fn parse(body: &str) -> Self {
        if body.trim().is_empty() {
            return ErrorBody::Empty;
        }
        // Only an object carries `message`/`errors`; arrays and scalars are text.
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(mut fields)) => ErrorBody::Parsed {
                message: fields.remove("message").and_then(value_text),
                errors: fields.remove("errors").and_then(|errors| match errors {
                    Value::Array(items) => {
                        Some(items.into_iter().filter_map(value_text).collect())
                    }
                    other => value_text(other).map(|single| vec![single]),
                }),
            },
            _ => ErrorBody::Raw(body.to_string()),
        }
    }

    /// The `message` field, then the raw text, then "Unknown error".
    ///
    /// `None` only for a JSON body without a `message`.
    pub fn message(&self) -> Option<&str> {
        match self {
            ErrorBody::Parsed { message, .. } => message.as_deref(),
            ErrorBody::Raw(text) => Some(text),
            ErrorBody::Empty => Some("Unknown error"),
        }
    }

    /// The `message` field of a JSON body only.
    pub fn parsed_message(&self) -> Option<&str> {
        match self {
            ErrorBody::Parsed { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn errors(&self) -> Option<&[String]> {
        match self {
            ErrorBody::Parsed { errors, .. } => errors.as_deref(),
            _ => None,
        }
    }
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
