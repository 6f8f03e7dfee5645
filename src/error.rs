// src/error.rs
//! Error types for talking to a wiki.
//!
//! The variants mirror the ways a round-trip can end badly: the server never
//! answered usefully, the body was not the API's JSON, the API answered with a
//! structured error, or the caller asked for something the site cannot do.

use std::fmt;
use thiserror::Error;

/// MediaWiki API error codes as a typed vocabulary.
///
/// Only codes the client reacts to get their own variant; everything else is
/// carried verbatim in `Unknown` so callers can still branch on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Replication lag exceeds the request's `maxlag`; wait and retry
    Maxlag,
    /// The acting account is blocked from editing
    Blocked,
    /// A required parameter is missing
    NoTitle,
    /// The page does not exist
    MissingTitle,
    /// The edit token is missing or stale
    BadToken,
    /// The account lacks the right for this action
    PermissionDenied,
    /// `assert=` failed (e.g. logged out mid-session); holds the exact code
    AssertFailed(String),
    /// The server is in read-only mode
    ReadOnly,
    /// A code this client doesn't recognize
    Unknown(String),
}

impl ApiErrorCode {
    /// Parse the `error.code` string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "maxlag" => Self::Maxlag,
            "blocked" => Self::Blocked,
            "notitle" => Self::NoTitle,
            "missingtitle" => Self::MissingTitle,
            "badtoken" => Self::BadToken,
            "permissiondenied" => Self::PermissionDenied,
            "assertuserfailed" | "assertbotfailed" | "assertnameduserfailed" => {
                Self::AssertFailed(code.to_string())
            }
            "readonly" => Self::ReadOnly,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether the server wants the client to wait and resend unchanged.
    pub fn is_lag(&self) -> bool {
        matches!(self, Self::Maxlag)
    }

    /// Whether the acting account is blocked.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked)
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Maxlag => write!(f, "maxlag"),
            Self::Blocked => write!(f, "blocked"),
            Self::NoTitle => write!(f, "notitle"),
            Self::MissingTitle => write!(f, "missingtitle"),
            Self::BadToken => write!(f, "badtoken"),
            Self::PermissionDenied => write!(f, "permissiondenied"),
            Self::AssertFailed(code) => write!(f, "{}", code),
            Self::ReadOnly => write!(f, "readonly"),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Failure of a single HTTP round-trip, before any JSON is looked at.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP transport error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// For [`crate::HttpTransport`] implementations with failures of their own
    #[error("HTTP transport error: {0}")]
    Other(String),
}

/// Main error type for every wiki operation.
#[derive(Error, Debug)]
pub enum WikiError {
    /// The transport kept failing until the wait budget ran out, or failed on
    /// a write request where no retry is attempted.
    #[error("Server error: {0}")]
    Server(#[source] TransportError),

    /// The body was never valid JSON before the wait budget ran out.
    #[error("Invalid JSON received. API is broken, or this isn't a MediaWiki API: {preview}")]
    ApiFailure { preview: String },

    /// The endpoint answered, but the API is switched off.
    #[error("The API is not enabled on this site")]
    ApiDisabled,

    /// The API answered with a structured error.
    #[error("API error ({code}): {message}")]
    ApiQuery { code: ApiErrorCode, message: String },

    /// A write was refused because the account is blocked.
    #[error("User is blocked: {0}")]
    UserBlocked(String),

    /// The site lacks a feature the operation needs.
    #[error("Unsupported by this wiki: {0}")]
    Unsupported(String),

    #[error("The result format is fixed to json and can not be changed")]
    FormatLocked,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WikiError {
    /// The structured API error code, if this is an API error.
    pub fn api_code(&self) -> Option<&ApiErrorCode> {
        match self {
            Self::ApiQuery { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<url::ParseError> for WikiError {
    fn from(err: url::ParseError) -> Self {
        WikiError::Configuration(format!("Invalid API URL: {}", err))
    }
}

/// Result type alias for convenience
pub type Result<T, E = WikiError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_display() {
        for code in ["maxlag", "blocked", "badtoken", "readonly", "ratelimited"] {
            assert_eq!(ApiErrorCode::from_api_response(code).to_string(), code);
        }
    }

    #[test]
    fn assert_codes_keep_their_exact_name() {
        for code in ["assertuserfailed", "assertbotfailed", "assertnameduserfailed"] {
            let parsed = ApiErrorCode::from_api_response(code);
            assert_eq!(parsed, ApiErrorCode::AssertFailed(code.to_string()));
            assert_eq!(parsed.to_string(), code);
        }
    }

    #[test]
    fn unknown_codes_are_kept_verbatim() {
        let code = ApiErrorCode::from_api_response("articleexists");
        assert_eq!(code, ApiErrorCode::Unknown("articleexists".to_string()));
        assert!(!code.is_lag());
    }

    #[test]
    fn api_query_error_message() {
        let err = WikiError::ApiQuery {
            code: ApiErrorCode::MissingTitle,
            message: "The page you specified doesn't exist.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error (missingtitle): The page you specified doesn't exist."
        );
        assert_eq!(err.api_code(), Some(&ApiErrorCode::MissingTitle));
    }
}
