//! In-memory session cache implementation.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use super::{CacheError, CacheKey, CacheShape, CacheValue};

/// In-memory session cache shared by the interactive loop and the
/// background refresh task.
///
/// Nothing is persisted; data is lost when the process exits.
///
/// # Thread Safety
///
/// All state sits behind an internal `RwLock`. Callers never take a lock
/// themselves, and no lock is held across an await point because every
/// method is synchronous and returns owned data.
pub struct SessionCache {
    data: RwLock<HashMap<String, CacheValue>>,
}

impl SessionCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Store `value` under `key`, overwriting whatever was there.
    pub fn set<T: CacheShape>(&self, key: &str, value: T) {
        let value = value.into_value();
        debug!(key, shape = value.shape(), "cache set");
        self.data.write().insert(key.to_string(), value);
    }

    /// Read a clone of the value under `key` as shape `T`.
    pub fn get<T: CacheShape + Clone>(&self, key: &str) -> Result<T, CacheError> {
        let data = self.data.read();
        let value = data.get(key).ok_or_else(|| CacheError::NotFound {
            key: key.to_string(),
        })?;
        T::from_value(value)
            .cloned()
            .ok_or_else(|| CacheError::TypeMismatch {
                key: key.to_string(),
                expected: T::SHAPE,
                found: value.shape(),
            })
    }

    /// Typed variant of [`set`](Self::set).
    pub fn store<T: CacheShape>(&self, key: &CacheKey<T>, value: T) {
        self.set(key.name(), value);
    }

    /// Typed variant of [`get`](Self::get).
    pub fn load<T: CacheShape + Clone>(&self, key: &CacheKey<T>) -> Result<T, CacheError> {
        self.get(key.name())
    }

    /// Remove a single key. Removing a missing key is not an error.
    pub fn remove(&self, key: &str) {
        if self.data.write().remove(key).is_some() {
            debug!(key, "cache remove");
        }
    }

    /// Check whether anything is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Remove every key.
    pub fn clear(&self) {
        let mut data = self.data.write();
        debug!(keys = data.len(), "cache clear");
        data.clear();
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("keys_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{IndexMap, PageCursor};
    use crate::cache::keys;
    use crate::token::TokenPair;
    use std::sync::Arc;
    use uuid::Uuid;

    #[test]
    fn test_cache_set_get() {
        let cache = SessionCache::new();
        cache.set("tokens", TokenPair::new("a1", "r1"));

        let tokens: TokenPair = cache.get("tokens").unwrap();
        assert_eq!(tokens.access_token.expose(), "a1");
        assert_eq!(tokens.refresh_token.expose(), "r1");
    }

    #[test]
    fn test_cache_get_never_written() {
        let cache = SessionCache::new();
        for key in ["tokens", "books.cursor", "", "anything"] {
            let result = cache.get::<TokenPair>(key);
            assert_eq!(
                result,
                Err(CacheError::NotFound {
                    key: key.to_string()
                })
            );
        }
    }

    #[test]
    fn test_cache_type_mismatch() {
        let cache = SessionCache::new();
        cache.set("books.cursor", PageCursor::first(10));

        let result = cache.get::<TokenPair>("books.cursor");
        assert_eq!(
            result,
            Err(CacheError::TypeMismatch {
                key: "books.cursor".to_string(),
                expected: "token pair",
                found: "page cursor",
            })
        );

        let result = cache.get::<IndexMap>("books.cursor");
        assert!(matches!(result, Err(CacheError::TypeMismatch { .. })));

        // The stored value is untouched by a failed read.
        assert_eq!(cache.get::<PageCursor>("books.cursor").unwrap().limit, 10);
    }

    #[test]
    fn test_cache_overwrite_changes_shape() {
        let cache = SessionCache::new();
        cache.set("k", PageCursor::first(5));
        cache.set("k", IndexMap::new(vec![Uuid::new_v4()], 0));

        assert!(cache.get::<IndexMap>("k").is_ok());
        assert!(matches!(
            cache.get::<PageCursor>("k"),
            Err(CacheError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_cache_clear() {
        let cache = SessionCache::new();
        cache.store(&keys::TOKENS, TokenPair::new("a", "r"));
        cache.store(&keys::BOOKS_CURSOR, PageCursor::first(10));
        cache.store(&keys::BOOKS_INDEX, IndexMap::default());
        assert_eq!(cache.len(), 3);

        cache.clear();

        assert!(cache.is_empty());
        assert!(matches!(
            cache.load(&keys::TOKENS),
            Err(CacheError::NotFound { .. })
        ));
        assert!(matches!(
            cache.load(&keys::BOOKS_CURSOR),
            Err(CacheError::NotFound { .. })
        ));
        assert!(matches!(
            cache.load(&keys::BOOKS_INDEX),
            Err(CacheError::NotFound { .. })
        ));
    }

    #[test]
    fn test_cache_remove() {
        let cache = SessionCache::new();
        cache.store(&keys::TOKENS, TokenPair::new("a", "r"));
        cache.remove("tokens");
        cache.remove("tokens");
        assert!(!cache.contains("tokens"));
    }

    #[test]
    fn test_cache_concurrent_access() {
        let cache = Arc::new(SessionCache::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let cache = cache.clone();
            handles.push(std::thread::spawn(move || {
                for j in 0..200 {
                    cache.set("tokens", TokenPair::new(format!("a{i}-{j}"), "r"));
                    let _ = cache.get::<TokenPair>("tokens");
                    if j % 50 == 0 {
                        cache.clear();
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.len() <= 1);
    }
}
