//! Error types for the Alliant API client

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::resource::{Action, ResourceKind};

/// Errors that can occur when using the Alliant API client
///
/// Errors and warnings reported by the API inside a response body are not
/// represented here; they are data on [`crate::ApiResponse`].
#[derive(Error, Debug)]
pub enum AlliantError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Login was rejected
    #[error("Authentication failed ({status}): {message}")]
    Authentication {
        /// Status code of the login response
        status: reqwest::StatusCode,
        /// Messages reported by the API, joined
        message: String,
    },

    /// An authenticated call was attempted without a usable session
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Client or server error status, raised by `ApiResponse::error_for_status`
    #[error("HTTP status {status} for {url}")]
    Http {
        /// The status code that was received
        status: reqwest::StatusCode,
        /// Final URL of the request
        url: reqwest::Url,
    },

    /// Base URL could not be used to build endpoint URLs
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Client initialization failed
    #[error("Client initialization failed: {0}")]
    ClientInit(String),

    /// `login` was called on a client built without credentials
    #[error("No credentials configured for login")]
    MissingCredentials,

    /// The resource does not support the requested action
    #[error("Action '{action}' is not supported for {resource}")]
    ActionNotSupported {
        /// Resource the action was requested on
        resource: ResourceKind,
        /// The rejected action
        action: Action,
    },

    /// The action needs a comment and none was given
    #[error("Action '{action}' on {resource} requires a comment")]
    CommentRequired {
        /// Resource the action was requested on
        resource: ResourceKind,
        /// The action missing a comment
        action: Action,
    },

    /// Transaction characteristic numbers run from 1 to 20
    #[error("Transaction characteristic must be between 1 and 20, got {0}")]
    InvalidTransactionCharacteristic(u8),

    /// A record did not carry a field the operation depends on
    #[error("Unexpected result: missing '{0}'")]
    UnexpectedResult(&'static str),
}

/// Reasons an authenticated call cannot proceed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// `login` has not been called, or it failed
    #[error("not logged in")]
    NotLoggedIn,

    /// The token's expiry has passed; call `login` again
    #[error("session expired at {expired_at}")]
    Expired {
        /// Expiry reported by the server at login
        expired_at: DateTime<Utc>,
    },

    /// The session was logged out and cannot be reused
    #[error("session has been logged out")]
    Closed,
}
