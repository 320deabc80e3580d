//! Generic request/response pipeline.
//!
//! A [`RequestSpec`] describes one HTTP call declaratively; a
//! [`RequestExecutor`] turns it into a `reqwest` call and returns a fully
//! drained [`ResponseEnvelope`]. The executor never interprets status codes;
//! callers use [`ResponseEnvelope::expect_status`] for that.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::error::ClientError;

/// Timeout applied when a spec does not set its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// What went wrong below the HTTP status level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The whole call did not finish within the spec's timeout.
    Timeout,
    /// No connection could be established.
    Connect,
    /// The URL could not be built.
    InvalidUrl,
    /// The body could not be serialized or a header was malformed.
    Encode,
    /// The response body could not be read.
    Body,
    /// Anything else reported by the HTTP stack.
    Other,
}

/// Error type for failed HTTP exchanges.
#[derive(Debug, Clone, Error)]
#[error("{kind:?} error: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether the call ran out of time.
    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else if err.is_builder() {
            TransportErrorKind::InvalidUrl
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, err.to_string())
    }
}

/// Declarative description of a single HTTP call.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    /// Absolute URL, or a path relative to the executor's base URL.
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
    pub timeout: Duration,
}

impl RequestSpec {
    /// Create a spec with the JSON content type and the default timeout.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE.as_str().to_string(), "application/json".to_string());
        Self {
            method,
            url: url.into(),
            headers,
            query: BTreeMap::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Set a header, replacing an earlier value with the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add `Authorization: Bearer <token>`.
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    /// Set a query parameter, replacing an earlier value with the same name.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Merge a set of query parameters into the spec.
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in params {
            self.query.insert(name.into(), value.into());
        }
        self
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, TransportError> {
        let value = serde_json::to_value(body)
            .map_err(|e| TransportError::new(TransportErrorKind::Encode, e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Normalized result of one HTTP call. The body is always fully read.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    /// Status line, e.g. `200 OK`.
    pub status: String,
    pub status_code: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ResponseEnvelope {
    /// Succeed only on `expected`.
    ///
    /// Any other status becomes [`ClientError::Domain`] carrying the body
    /// decoded as a JSON string, or [`ClientError::Decode`] when the body is
    /// not a JSON string.
    pub fn expect_status(&self, expected: StatusCode) -> Result<&Self, ClientError> {
        if self.status_code == expected {
            return Ok(self);
        }
        let message: String = serde_json::from_slice(&self.body).map_err(|e| {
            ClientError::Decode {
                message: format!("{} response body: {}", self.status, e),
            }
        })?;
        Err(ClientError::Domain {
            status: self.status_code.as_u16(),
            message,
        })
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::Decode {
            message: e.to_string(),
        })
    }
}

/// Executes [`RequestSpec`]s against a base URL.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
    base_url: Url,
}

impl RequestExecutor {
    /// Create an executor for `base_url`.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TransportError::new(TransportErrorKind::InvalidUrl, e.to_string()))?;
        let client = Client::builder().build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the final URL: append relative paths to the base URL's path and
    /// merge the spec's query parameters over any already present.
    ///
    /// `/books` against `http://host/library` resolves to
    /// `http://host/library/books`.
    pub fn resolve_url(&self, spec: &RequestSpec) -> Result<Url, TransportError> {
        let mut url = match Url::parse(&spec.url) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => self.append_to_base(&spec.url),
            Err(e) => return Err(TransportError::new(TransportErrorKind::InvalidUrl, e.to_string())),
        };

        if !spec.query.is_empty() {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(name, _)| !spec.query.contains_key(name.as_ref()))
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .extend_pairs(spec.query.iter());
        }

        Ok(url)
    }

    fn append_to_base(&self, relative: &str) -> Url {
        let (path, query) = match relative.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (relative, None),
        };
        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            self.base_url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url.set_query(query);
        url.set_fragment(None);
        url
    }

    /// Perform the call described by `spec`.
    ///
    /// The timeout covers connect, send and the full body read. The response
    /// is dropped (and its connection released) on every path out of this
    /// function.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<ResponseEnvelope, TransportError> {
        let url = self.resolve_url(spec)?;

        let mut headers = HeaderMap::new();
        for (name, value) in &spec.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::new(TransportErrorKind::Encode, e.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::new(TransportErrorKind::Encode, e.to_string()))?;
            headers.insert(name, value);
        }

        let mut request = self
            .client
            .request(spec.method.clone(), url.clone())
            .headers(headers)
            .timeout(spec.timeout);

        if let Some(body) = &spec.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| TransportError::new(TransportErrorKind::Encode, e.to_string()))?;
            request = request.body(bytes);
        }

        debug!(method = %spec.method, %url, "sending request");

        let response = request.send().await?;
        let status_code = response.status();
        let status = match status_code.canonical_reason() {
            Some(reason) => format!("{} {}", status_code.as_u16(), reason),
            None => status_code.as_u16().to_string(),
        };
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        debug!(%url, status = %status, bytes = body.len(), "received response");

        Ok(ResponseEnvelope {
            status,
            status_code,
            headers,
            body,
        })
    }
}
