//! Error handling for the PH-Shoes client

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Fallback shown whenever a backend error cannot be turned into something
/// a person should read.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Friendly replacement for the account-not-found backend code.
pub const ACCOUNT_NOT_FOUND_MESSAGE: &str =
    "We could not find your account. Please refresh or sign in again.";

/// Unified error type for the PH-Shoes client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP transport errors (no response received)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Non-success response from a backend service, body kept for flattening
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// 401/403 on an authenticated endpoint; the session is no longer valid
    #[error("session is no longer authorized")]
    Unauthorized,

    /// Authentication flow errors (login, token handling)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A search query was rejected before or by the text-search service
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A suppression token was required but not available
    #[error("Missing token: {0}")]
    MissingToken(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// True when the request never produced a response (connect, DNS,
    /// timeout). Status-code failures are represented as [`Error::Api`].
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(inner) if inner.status().is_none())
    }

    /// Flatten this error into a short string fit for display.
    ///
    /// Structured backend payloads are joined and mapped through the
    /// friendly-message table; raw machine codes never reach the caller.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { body, .. } => extract_backend_message(body)
                .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
            Error::Auth(msg) | Error::InvalidQuery(msg) | Error::MissingToken(msg) => msg.clone(),
            Error::Unauthorized => ACCOUNT_NOT_FOUND_MESSAGE.to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Per-field validation messages from a backend error payload, keyed by
    /// field name. Empty for anything that is not a structured 4xx.
    pub fn field_errors(&self) -> HashMap<String, String> {
        let mut out = HashMap::new();
        if let Error::Api { body, .. } = self {
            if let Ok(parsed) = serde_json::from_str::<BackendErrorResponse>(body) {
                if let Some(errors) = parsed.errors {
                    for (field, messages) in errors {
                        out.insert(field, messages.join(" "));
                    }
                }
            }
        }
        out
    }
}

/// Error body shape shared by the PH-Shoes backend services
#[derive(Debug, Clone, Deserialize)]
pub struct BackendErrorResponse {
    pub status: Option<u16>,
    pub error: Option<String>,
    pub message: Option<String>,
    /// Per-field validation messages
    pub errors: Option<HashMap<String, Vec<String>>>,
}

fn extract_backend_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<BackendErrorResponse>(body).ok()?;
    if let Some(errors) = &parsed.errors {
        let joined = errors
            .values()
            .flat_map(|messages| messages.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(friendly) = to_friendly_message(&joined) {
            return Some(friendly);
        }
    }
    let candidate = parsed.error.as_deref().or(parsed.message.as_deref())?;
    to_friendly_message(candidate)
}

/// Map a raw backend message to something presentable, or `None` for blanks.
///
/// Known codes get a fixed replacement; unrecognized machine-style codes
/// (snake/dot case, no spaces) are swapped for the generic message so they
/// never leak to users.
pub(crate) fn to_friendly_message(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "error.account.notFound" {
        return Some(ACCOUNT_NOT_FOUND_MESSAGE.to_string());
    }
    let looks_like_code =
        !trimmed.contains(' ') && (trimmed.contains('_') || trimmed.contains('.'));
    if looks_like_code {
        return Some(GENERIC_ERROR_MESSAGE.to_string());
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(body: &str) -> Error {
        Error::Api {
            status: 400,
            body: body.to_string(),
        }
    }

    #[test]
    fn joins_field_errors_into_one_message() {
        let err = api(
            r#"{"status":400,"error":"Bad Request","errors":{"email":["Email is invalid.","Email is required."]}}"#,
        );
        assert_eq!(err.user_message(), "Email is invalid. Email is required.");
    }

    #[test]
    fn maps_known_code_to_friendly_message() {
        let err = api(r#"{"status":404,"error":"error.account.notFound"}"#);
        assert_eq!(err.user_message(), ACCOUNT_NOT_FOUND_MESSAGE);
    }

    #[test]
    fn hides_unknown_machine_codes() {
        let err = api(r#"{"status":422,"error":"error.validation.password_too_short"}"#);
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn passes_through_human_readable_messages() {
        let err = api(r#"{"status":401,"message":"Invalid email or password."}"#);
        assert_eq!(err.user_message(), "Invalid email or password.");
    }

    #[test]
    fn unparseable_body_falls_back_to_generic() {
        let err = api("<html>Bad Gateway</html>");
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn field_errors_are_keyed_by_field() {
        let err = api(r#"{"status":400,"errors":{"password":["Too short.","Needs a digit."]}}"#);
        let fields = err.field_errors();
        assert_eq!(fields.get("password").unwrap(), "Too short. Needs a digit.");
    }
}
