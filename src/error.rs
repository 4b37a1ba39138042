//! Error types surfaced by the digest session and its collaborators.

use thiserror::Error;

use crate::persistence::PersistenceError;

/// Message shown when a fetch is attempted without a repository.
pub const MISSING_REPOSITORY_MESSAGE: &str = "Please provide both owner and repo";

/// Errors raised while fetching diffs, generating notes, or loading
/// configuration.
///
/// The `Display` text of the fetch-path variants is exactly what the session
/// stores in its `error` flag, so server messages pass through untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DigestError {
    /// Owner or repository was missing; no request was attempted.
    #[error("{message}")]
    Validation {
        /// Human-readable validation failure.
        message: String,
    },

    /// The listing request did not complete before the deadline.
    #[error("Request timed out")]
    Timeout,

    /// The in-flight request was cancelled before it completed.
    #[error("Request cancelled")]
    Cancelled,

    /// Networking failed while talking to a remote endpoint.
    #[error("{message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// The remote endpoint answered with a non-success status.
    #[error("{message}")]
    Server {
        /// HTTP status code returned by the endpoint.
        status: u16,
        /// Server-provided message, or a generic status message.
        message: String,
    },

    /// A response body could not be decoded.
    #[error("{message}")]
    Decode {
        /// Decoder error detail.
        message: String,
    },

    /// Release note generation failed for a single pull request.
    #[error("release note generation failed: {message}")]
    Generation {
        /// Provider or parsing failure detail.
        message: String,
    },

    /// Configuration could not be loaded or was inconsistent.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// The key-value session store failed.
    #[error("session store error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },
}

impl DigestError {
    /// Builds the validation error raised when owner or repo is blank.
    #[must_use]
    pub fn missing_repository() -> Self {
        Self::Validation {
            message: MISSING_REPOSITORY_MESSAGE.to_owned(),
        }
    }

    /// Builds the generic message used when a server omits an error body.
    #[must_use]
    pub fn http_status(status: u16) -> Self {
        Self::Server {
            status,
            message: format!("HTTP error! status: {status}"),
        }
    }
}
