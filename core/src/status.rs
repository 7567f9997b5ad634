//! Status-code dispatch: maps an `HttpResponse` to a JSON payload or an error.
//!
//! # Design
//! The mapping is a static table of `(status, rule)` rows rather than
//! branching code, so every row can be enumerated and tested. Codes missing
//! from the table fall through to a generic "HTTP {code}: {reason}" error.

use serde_json::Value;

use self::MessageRule::{BodyMessage, Fixed, JoinedErrors, ParsedMessage};
use crate::error::ApiErrorKind::{ExternalService, NotFound, RateLimit, Validation};
use crate::error::{ApiError, ApiErrorKind, Error, ErrorBody, Result};
use crate::http::HttpResponse;

/// How a status code turns into an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRule {
    /// Empty body decodes to null, anything else must be JSON.
    Json,
    /// Always null; the body is ignored.
    NoContent,
    /// `Error::Authentication` with a fixed message.
    Unauthorized(&'static str),
    /// An `ApiError` of `kind` whose message comes from `message`.
    Fail(ApiErrorKind, MessageRule),
    /// `TrialLimit` if the lenient message mentions the trial limit,
    /// otherwise a generic error with the fixed message.
    Forbidden(&'static str),
}

/// Where an error message comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRule {
    Fixed(&'static str),
    /// Lenient body message; the fallback covers a JSON body without one.
    BodyMessage(&'static str),
    /// The JSON body's `message` only; anything else yields the fallback.
    ParsedMessage(&'static str),
    /// The `errors` array joined with ", ", else the fallback.
    JoinedErrors(&'static str),
}

pub const TRIAL_LIMIT_MARKER: &str = "Trial limit";

pub static STATUS_TABLE: &[(u16, StatusRule)] = &[
    (200, StatusRule::Json),
    (201, StatusRule::Json),
    (204, StatusRule::NoContent),
    (400, StatusRule::Fail(Validation, BodyMessage("Bad Request"))),
    (401, StatusRule::Unauthorized("Unauthorized")),
    (403, StatusRule::Forbidden("Forbidden")),
    (404, StatusRule::Fail(NotFound, Fixed("Resource not found"))),
    (422, StatusRule::Fail(Validation, JoinedErrors("Validation failed"))),
    (429, StatusRule::Fail(RateLimit, Fixed("Rate limit exceeded"))),
    (502, StatusRule::Fail(ExternalService, ParsedMessage("Bad Gateway"))),
];

pub fn rule_for(status: u16) -> Option<StatusRule> {
    STATUS_TABLE
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, rule)| *rule)
}

/// Decode a response into its JSON payload or the matching error.
pub fn decode_response(response: HttpResponse) -> Result<Value> {
    let HttpResponse { status, reason, body, .. } = response;
    let Some(rule) = rule_for(status) else {
        let message = format!("HTTP {status}: {reason}");
        return Err(ApiError::new(ApiErrorKind::Generic, status, message, body).into());
    };

    match rule {
        StatusRule::Json if body.trim().is_empty() => Ok(Value::Null),
        StatusRule::Json => {
            serde_json::from_str(&body).map_err(|e| Error::Deserialization(e.to_string()))
        }
        StatusRule::NoContent => Ok(Value::Null),
        StatusRule::Unauthorized(message) => Err(Error::Authentication {
            message: message.to_string(),
            status: Some(status),
            body: Some(body),
        }),
        StatusRule::Forbidden(fallback) => {
            let parsed = ErrorBody::parse(&body);
            let error = match parsed.message() {
                Some(message) if message.contains(TRIAL_LIMIT_MARKER) => {
                    ApiError::new(ApiErrorKind::TrialLimit, status, message, body)
                }
                _ => ApiError::new(ApiErrorKind::Generic, status, fallback, body),
            };
            Err(error.into())
        }
        StatusRule::Fail(kind, message_rule) => {
            let message = message_for(message_rule, &body);
            Err(ApiError::new(kind, status, message, body).into())
        }
    }
}

fn message_for(rule: MessageRule, body: &str) -> String {
    match rule {
        Fixed(message) => message.to_string(),
        BodyMessage(fallback) => ErrorBody::parse(body).message().unwrap_or(fallback).to_string(),
        ParsedMessage(fallback) => {
            ErrorBody::parse(body).parsed_message().unwrap_or(fallback).to_string()
        }
        JoinedErrors(fallback) => match ErrorBody::parse(body).errors() {
            Some(errors) => errors.join(", "),
            None => fallback.to_string(),
        },
    }
}
