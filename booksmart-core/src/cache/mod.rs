//! Session cache.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`CacheValue`] - The closed set of payload shapes a session may remember
//! - [`CacheShape`] - Conversion between a concrete payload and [`CacheValue`]
//! - [`CacheKey`] - A key name bound to the payload type stored under it
//! - [`SessionCache`] - Process-local, concurrent-safe key/value store
//!
//! # Key Convention
//!
//! Keys are plain strings. The well-known ones live in [`keys`]; browsing
//! menus use `{resource}.cursor` and `{resource}.index`.
//!
//! # Example
//!
//! ```rust
//! use booksmart_core::cache::{keys, SessionCache};
//! use booksmart_core::TokenPair;
//!
//! let cache = SessionCache::new();
//! cache.store(&keys::TOKENS, TokenPair::new("access", "refresh"));
//!
//! let tokens = cache.load(&keys::TOKENS).unwrap();
//! assert_eq!(tokens.access_token.expose(), "access");
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

use crate::browser::{IndexMap, PageCursor};
use crate::token::TokenPair;

mod memory;

pub use memory::SessionCache;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the buffer is wiped when the secret is dropped.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// Error type for session cache reads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The key was never set, or was removed or cleared.
    #[error("nothing cached under '{key}'")]
    NotFound { key: String },

    /// The key holds a payload of a different shape than requested.
    #[error("cached value under '{key}' is a {found}, not a {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Every payload shape the session cache can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Tokens(TokenPair),
    Cursor(PageCursor),
    Index(IndexMap),
}

impl CacheValue {
    /// Name of the payload shape, used in mismatch errors and logs.
    pub fn shape(&self) -> &'static str {
        match self {
            CacheValue::Tokens(_) => TokenPair::SHAPE,
            CacheValue::Cursor(_) => PageCursor::SHAPE,
            CacheValue::Index(_) => IndexMap::SHAPE,
        }
    }
}

/// A concrete payload type that has a variant in [`CacheValue`].
pub trait CacheShape: Sized {
    /// Human-readable shape name.
    const SHAPE: &'static str;

    /// Wrap the payload for storage.
    fn into_value(self) -> CacheValue;

    /// Borrow the payload back out, or `None` if the variant differs.
    fn from_value(value: &CacheValue) -> Option<&Self>;
}

impl CacheShape for TokenPair {
    const SHAPE: &'static str = "token pair";

    fn into_value(self) -> CacheValue {
        CacheValue::Tokens(self)
    }

    fn from_value(value: &CacheValue) -> Option<&Self> {
        match value {
            CacheValue::Tokens(tokens) => Some(tokens),
            _ => None,
        }
    }
}

impl CacheShape for PageCursor {
    const SHAPE: &'static str = "page cursor";

    fn into_value(self) -> CacheValue {
        CacheValue::Cursor(self)
    }

    fn from_value(value: &CacheValue) -> Option<&Self> {
        match value {
            CacheValue::Cursor(cursor) => Some(cursor),
            _ => None,
        }
    }
}

impl CacheShape for IndexMap {
    const SHAPE: &'static str = "index map";

    fn into_value(self) -> CacheValue {
        CacheValue::Index(self)
    }

    fn from_value(value: &CacheValue) -> Option<&Self> {
        match value {
            CacheValue::Index(index) => Some(index),
            _ => None,
        }
    }
}

/// A cache key name tied to the payload type stored under it.
///
/// Reading through a `CacheKey` cannot ask for the wrong shape; only a
/// `NotFound` outcome remains possible at runtime.
pub struct CacheKey<T> {
    name: &'static str,
    _shape: PhantomData<fn() -> T>,
}

impl<T: CacheShape> CacheKey<T> {
    /// Bind a key name to a payload type.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _shape: PhantomData,
        }
    }

    /// The raw key string.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for CacheKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CacheKey<T> {}

impl<T> fmt::Debug for CacheKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacheKey").field(&self.name).finish()
    }
}

/// Well-known cache keys.
pub mod keys {
    use super::CacheKey;
    use crate::browser::{IndexMap, PageCursor};
    use crate::token::TokenPair;

    /// Token pair of the signed-in session.
    pub const TOKENS: CacheKey<TokenPair> = CacheKey::new("tokens");

    /// Cursor of the book catalog browser.
    pub const BOOKS_CURSOR: CacheKey<PageCursor> = CacheKey::new("books.cursor");

    /// Row index of the most recent catalog page.
    pub const BOOKS_INDEX: CacheKey<IndexMap> = CacheKey::new("books.index");

    /// Row index of the most recent reservations listing.
    pub const RESERVATIONS_INDEX: CacheKey<IndexMap> = CacheKey::new("reservations.index");
}
