//! Error types for the HamQTH client library.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, HamQthError>;

/// Every failure a callbook lookup can surface to the caller.
///
/// A rejected session is not in this list: the client refreshes the session
/// and retries once on its own, and only reports what happens after that.
#[derive(Error, Debug)]
pub enum HamQthError {
    /// Username or password missing from the environment
    #[error("HamQTH credentials not set. Please set {user_var} and {pass_var}.")]
    MissingCredentials {
        user_var: &'static str,
        pass_var: &'static str,
    },

    /// Transport-level failure: timeout, refused connection, DNS, broken body
    #[error("Network error while contacting HamQTH: {0}")]
    Network(reqwest::Error),

    /// The HTTP client could not be built (TLS backend, bad user agent)
    #[error("Failed to set up the HTTP client: {0}")]
    ClientSetup(reqwest::Error),

    /// The server answered with a non-success status code
    #[error("HTTP error from HamQTH: status {status}")]
    Http { status: StatusCode },

    /// The response body was not well-formed XML
    #[error("XML parsing error: {message}")]
    MalformedResponse { message: String },

    /// The configured endpoint is not a valid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HamQTH refused the username/password pair
    #[error("HamQTH login failed: {reason}")]
    LoginFailed { reason: String },

    /// HamQTH has no record for the call sign
    #[error("Call sign not found in HamQTH: {callsign}")]
    NotFound { callsign: String },

    /// The response was well-formed XML but not shaped as expected
    #[error("Unexpected HamQTH response: {message}")]
    UnexpectedFormat { message: String },

    /// A required value was missing or blank
    #[error("{field} must not be blank")]
    Validation { field: String },
}

impl HamQthError {
    /// Create a new malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a new login failure
    pub fn login_failed(reason: impl Into<String>) -> Self {
        Self::LoginFailed {
            reason: reason.into(),
        }
    }

    /// Create a new not found error
    pub fn not_found(callsign: impl Into<String>) -> Self {
        Self::NotFound {
            callsign: callsign.into(),
        }
    }

    /// Create a new unexpected format error
    pub fn unexpected_format(message: impl Into<String>) -> Self {
        Self::UnexpectedFormat {
            message: message.into(),
        }
    }

    /// Create a new validation error naming the offending field
    pub fn validation(field: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
        }
    }

    /// Check if the call sign simply has no callbook entry
    pub fn is_not_found(&self) -> bool {
        matches!(self, HamQthError::NotFound { .. })
    }

    /// Check if trying again later might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            HamQthError::Network(_) => true,
            HamQthError::Http { status } => status.is_server_error(),
            _ => false,
        }
    }
}
