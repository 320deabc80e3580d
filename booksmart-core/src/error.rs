//! Top-level error types for the BookSmart client.

use thiserror::Error;

use crate::browser::SelectionError;
use crate::cache::CacheError;
use crate::request::TransportError;

/// Top-level error type encompassing every failure a user action can hit.
///
/// The interactive loop prints these and carries on; none of them is fatal.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure or timeout.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service answered with an unexpected status and a message.
    #[error("{message}")]
    Domain { status: u16, message: String },

    /// A response body could not be decoded.
    #[error("malformed response: {message}")]
    Decode { message: String },

    /// Session cache misuse (missing key or wrong shape).
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The row number typed by the user does not exist.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// The service rejected the access token.
    #[error("you are not authenticated")]
    Unauthenticated,

    /// Background refresh gave up; the user has to sign in again.
    #[error("session expired, please sign in again")]
    SessionExpired,

    /// An authenticated action was attempted without a session.
    #[error("you are not signed in")]
    NotSignedIn,

    /// Sign-in was attempted while a session is active.
    #[error("already signed in, sign out first")]
    AlreadySignedIn,

    /// The action conflicts with the current state of the resource.
    #[error("{message}")]
    Conflict { message: String },

    /// Session settings that cannot drive a session.
    #[error("invalid session settings: {0}")]
    InvalidSettings(String),
}

impl ClientError {
    /// Whether this error is a session cache miss.
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, ClientError::Cache(CacheError::NotFound { .. }))
    }
}
