//! Error types for admin API operations.
//!
//! Errors are categorized so callers can turn them into the right kind of
//! user feedback. Nothing in this crate retries on its own.

use declarative::Interrupted;
use std::fmt;

/// Result type alias for admin API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of admin API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Provider configuration is missing or unresolved.
    Configuration,
    /// The caller cancelled the call or its deadline passed.
    Cancelled,
    /// Connection or timeout failure talking to the admin API.
    Transport,
    /// The admin API answered with a non-200 status.
    Protocol,
    /// The admin API answered with a body we could not decode.
    Decode,
    /// The requested object is not in the metadata.
    NotFound,
}

impl ErrorCategory {
    /// Whether this error category is typically transient.
    ///
    /// Purely advisory: callers decide whether to run the operation again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Provider configuration error",
            Self::Cancelled => "Operation aborted",
            Self::Transport => "Could not reach the Hasura admin API",
            Self::Protocol => "Hasura admin API rejected the request",
            Self::Decode => "Unexpected response from the Hasura admin API",
            Self::NotFound => "Object not found in Hasura metadata",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Configuration => {
                "Set host/admin_secret in the provider block or HASURA_HOST/HASURA_GRAPHQL_ADMIN_SECRET"
            }
            Self::Cancelled => "Run the operation again with a longer timeout",
            Self::Transport => "Check that the Hasura endpoint is reachable and try again",
            Self::Protocol => "Check the response details and the admin secret",
            Self::Decode => "Check that the endpoint points at the Hasura metadata API",
            Self::NotFound => "The object may have been removed outside of this tool",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur talking to the admin API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A provider configuration value is missing or invalid.
    #[error("invalid provider configuration for \"{attribute}\": {message}")]
    Config {
        /// Attribute that failed to resolve.
        attribute: String,
        /// What is wrong with it.
        message: String,
    },

    /// The call was cancelled or ran past its deadline.
    #[error("request aborted: {0}")]
    Interrupted(#[from] Interrupted),

    /// HTTP request failed before a status was received.
    #[error("HTTP request failed: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The admin API answered with a non-200 status.
    #[error("HTTP request error. Response code: {status}; {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("unable to decode Hasura response: {0}")]
    Decode(String),

    /// The remote schema is not present in the exported metadata.
    #[error("remote schema '{0}' does not exist")]
    RemoteSchemaNotFound(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config { .. } => ErrorCategory::Configuration,
            Error::Interrupted(_) => ErrorCategory::Cancelled,
            Error::Transport { .. } => ErrorCategory::Transport,
            Error::Status { .. } => ErrorCategory::Protocol,
            Error::Decode(_) => ErrorCategory::Decode,
            Error::RemoteSchemaNotFound(_) => ErrorCategory::NotFound,
        }
    }

    /// HTTP status code, when the admin API answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Status {
                status: code,
                body: String::new(),
            },
            ureq::Error::Timeout(timeout) => Self::transport(format!("timed out ({timeout:?})")),
            other => Self::transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
