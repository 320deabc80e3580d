//! Token types and the refresh exchange.
//!
//! This module provides:
//! - [`TokenPair`] - The access/refresh token pair of a signed-in session
//! - [`TokenRefresher`] - Trait for exchanging a refresh token for a new pair
//! - [`HttpTokenRefresher`] - The refresh exchange against `/auth/refresh`

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::Secret;
use crate::request::{RequestExecutor, RequestSpec, TransportError};

/// Path of the refresh endpoint, relative to the service base URL.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Error type for a single refresh attempt.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    /// The service refused the refresh token (401/403).
    #[error("refresh token rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Any other non-success answer.
    #[error("token refresh failed ({status}): {message}")]
    Failed { status: u16, message: String },

    /// Network failure or timeout.
    #[error("network error during refresh: {0}")]
    Transport(#[from] TransportError),

    /// The success body was not a token pair.
    #[error("malformed refresh response: {message}")]
    Decode { message: String },

    /// There was no token pair in the session cache to refresh.
    #[error("no token pair cached")]
    NoTokens,
}

impl RefreshError {
    /// Whether the service explicitly rejected the refresh token.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, RefreshError::Rejected { .. })
    }
}

/// Access/refresh token pair returned by sign-in and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Bearer token for authenticated calls.
    #[serde(rename = "accessToken", alias = "access_token")]
    pub access_token: Secret,

    /// Token exchanged for the next pair.
    #[serde(rename = "refreshToken", alias = "refresh_token")]
    pub refresh_token: Secret,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token),
            refresh_token: Secret::new(refresh_token),
        }
    }
}

/// Exchanges the current refresh token for a new token pair.
///
/// The refresh loop is generic over this trait so tests can drive it
/// without a server.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, current: &TokenPair) -> Result<TokenPair, RefreshError>;
}

/// [`TokenRefresher`] that posts the refresh token to [`REFRESH_PATH`].
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher {
    executor: RequestExecutor,
    timeout: std::time::Duration,
}

impl HttpTokenRefresher {
    pub fn new(executor: RequestExecutor, timeout: std::time::Duration) -> Self {
        Self { executor, timeout }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, current: &TokenPair) -> Result<TokenPair, RefreshError> {
        let spec = RequestSpec::post(REFRESH_PATH)
            .json(current.refresh_token.expose())?
            .timeout(self.timeout);

        let response = self.executor.execute(&spec).await?;

        if response.status_code == StatusCode::OK {
            return serde_json::from_slice(&response.body).map_err(|e| RefreshError::Decode {
                message: e.to_string(),
            });
        }

        // The status alone decides rejection; an undecodable body is
        // reported in the message.
        let status = response.status_code.as_u16();
        let message = serde_json::from_slice::<String>(&response.body).unwrap_or_else(|e| {
            format!("malformed {} response body: {}", response.status, e)
        });

        match response.status_code {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(RefreshError::Rejected { status, message })
            }
            _ => Err(RefreshError::Failed { status, message }),
        }
    }
}
