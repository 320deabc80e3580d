//! Paginated resource browsing.
//!
//! A [`Browser`] keeps two entries in the session cache for one browsing
//! menu: a [`PageCursor`] that reproduces the next page of a list query, and
//! an [`IndexMap`] that turns the row numbers shown to the user back into
//! item identifiers. Every "do something with item N" action resolves N
//! through [`Browser::resolve_selection`] or [`Browser::resolve_row`].
//!
//! Lists the service returns whole (reservations) use [`Browser::unpaged`],
//! which keeps only the index.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::cache::{CacheError, CacheKey, SessionCache};
use crate::error::ClientError;
use crate::model::ItemId;
use crate::request::{DEFAULT_TIMEOUT, RequestExecutor, RequestSpec, ResponseEnvelope};

/// Page size used by the catalog.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Error type for resolving a user-typed item number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Position outside `0..len`.
    #[error("item number {index} out of range, expected 0..{len}")]
    OutOfRange { index: i64, len: usize },

    /// Rendered row number not on the most recent page.
    #[error("row number {row} is not on the current page")]
    RowOutOfRange { row: i64 },
}

/// Offset/limit/filter state reproducing the next page of a list query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageCursor {
    pub limit: u32,
    pub offset: u32,
    /// Filter query parameters, re-sent unchanged with every page.
    pub filter: BTreeMap<String, String>,
}

impl PageCursor {
    /// Cursor for the first page with no filter.
    pub fn first(limit: u32) -> Self {
        Self {
            limit,
            offset: 0,
            filter: BTreeMap::new(),
        }
    }

    pub fn with_filter(mut self, filter: BTreeMap<String, String>) -> Self {
        self.filter = filter;
        self
    }

    /// The cursor for the page after this one. The offset saturates at
    /// `u32::MAX`.
    pub fn advanced(&self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
            filter: self.filter.clone(),
        }
    }

    /// One-based page number of the page this cursor fetches.
    pub fn page_number(&self) -> u32 {
        if self.limit == 0 {
            1
        } else {
            self.offset / self.limit + 1
        }
    }

    /// All query parameters for the list request.
    pub fn query_params(&self) -> BTreeMap<String, String> {
        let mut params = self.filter.clone();
        params.insert("limit".to_string(), self.limit.to_string());
        params.insert("offset".to_string(), self.offset.to_string());
        params
    }
}

/// Ordered identifiers of the most recently displayed page.
///
/// Position `k` holds the item rendered as row `first_row + k`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexMap {
    ids: Vec<ItemId>,
    first_row: u32,
}

impl IndexMap {
    pub fn new(ids: Vec<ItemId>, first_row: u32) -> Self {
        Self { ids, first_row }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn first_row(&self) -> u32 {
        self.first_row
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    /// Identifier at position `index`.
    pub fn resolve(&self, index: i64) -> Result<ItemId, SelectionError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.ids.get(i).copied())
            .ok_or(SelectionError::OutOfRange {
                index,
                len: self.ids.len(),
            })
    }

    /// Identifier rendered as row number `row`.
    pub fn resolve_row(&self, row: i64) -> Result<ItemId, SelectionError> {
        self.resolve(row.saturating_sub(i64::from(self.first_row)))
            .map_err(|_| SelectionError::RowOutOfRange { row })
    }
}

/// An item that can appear in a browsable list.
pub trait Listed: DeserializeOwned {
    fn item_id(&self) -> ItemId;
}

/// One fetched page, ready for the table sink.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Row number of the first item.
    pub display_offset: u32,
    /// One-based page number.
    pub page_number: u32,
}

/// Paginated browser over the list endpoint at `path`.
pub struct Browser<T> {
    cache: Arc<SessionCache>,
    executor: RequestExecutor,
    path: String,
    /// `None` for lists the service does not paginate.
    cursor_key: Option<CacheKey<PageCursor>>,
    index_key: CacheKey<IndexMap>,
    limit: u32,
    timeout: Duration,
    _item: PhantomData<fn() -> T>,
}

impl<T: Listed> Browser<T> {
    pub fn new(
        cache: Arc<SessionCache>,
        executor: RequestExecutor,
        path: impl Into<String>,
        cursor_key: CacheKey<PageCursor>,
        index_key: CacheKey<IndexMap>,
    ) -> Self {
        Self::build(cache, executor, path.into(), Some(cursor_key), index_key)
    }

    /// Browser over a list the service returns whole. It never stores a
    /// cursor, so [`fetch_next_page`](Self::fetch_next_page) always misses.
    pub fn unpaged(
        cache: Arc<SessionCache>,
        executor: RequestExecutor,
        path: impl Into<String>,
        index_key: CacheKey<IndexMap>,
    ) -> Self {
        Self::build(cache, executor, path.into(), None, index_key)
    }

    fn build(
        cache: Arc<SessionCache>,
        executor: RequestExecutor,
        path: String,
        cursor_key: Option<CacheKey<PageCursor>>,
        index_key: CacheKey<IndexMap>,
    ) -> Self {
        Self {
            cache,
            executor,
            path,
            cursor_key,
            index_key,
            limit: DEFAULT_PAGE_LIMIT,
            timeout: DEFAULT_TIMEOUT,
            _item: PhantomData,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Start a browsing session, forgetting any earlier cursor and rows.
    pub fn enter(&self) {
        self.discard();
    }

    /// Leave the browsing menu so stale row numbers cannot resolve later.
    pub fn exit(&self) {
        self.discard();
    }

    fn discard(&self) {
        if let Some(cursor_key) = &self.cursor_key {
            self.cache.remove(cursor_key.name());
        }
        self.cache.remove(self.index_key.name());
    }

    /// Fetch the first page for `filter`, replacing the row index.
    pub async fn fetch_first_page(
        &self,
        filter: BTreeMap<String, String>,
    ) -> Result<Page<T>, ClientError> {
        let cursor = PageCursor::first(self.limit).with_filter(filter);
        self.fetch_at(cursor).await
    }

    /// Fetch the page after the last one fetched in this browsing session.
    ///
    /// Fails with a cache `NotFound` error when no first page was fetched.
    pub async fn fetch_next_page(&self) -> Result<Page<T>, ClientError> {
        let cursor_key = self.cursor_key.as_ref().ok_or_else(|| CacheError::NotFound {
            key: format!("{} cursor", self.path),
        })?;
        let cursor = self.cache.load(cursor_key)?;
        self.cache.load(&self.index_key)?;
        self.fetch_at(cursor).await
    }

    async fn fetch_at(&self, cursor: PageCursor) -> Result<Page<T>, ClientError> {
        let spec = RequestSpec::get(self.path.as_str())
            .queries(cursor.query_params())
            .timeout(self.timeout);

        let items: Vec<T> = self.list(&spec).await?;

        debug!(
            path = %self.path,
            offset = cursor.offset,
            count = items.len(),
            "fetched page"
        );

        let ids = items.iter().map(Listed::item_id).collect();
        self.cache.store(&self.index_key, IndexMap::new(ids, cursor.offset));
        if let Some(cursor_key) = &self.cursor_key {
            self.cache.store(cursor_key, cursor.advanced());
        }

        Ok(Page {
            items,
            display_offset: cursor.offset,
            page_number: cursor.page_number(),
        })
    }

    /// Take a whole-list response the caller already sent (e.g. with a
    /// bearer token) and replace the row index; rows start at 0.
    pub fn accept_unpaged(&self, response: &ResponseEnvelope) -> Result<Page<T>, ClientError> {
        let items: Vec<T> = response.expect_status(StatusCode::OK)?.json()?;
        let ids = items.iter().map(Listed::item_id).collect();
        self.cache.store(&self.index_key, IndexMap::new(ids, 0));

        Ok(Page {
            items,
            display_offset: 0,
            page_number: 1,
        })
    }

    async fn list(&self, spec: &RequestSpec) -> Result<Vec<T>, ClientError> {
        let response = self.executor.execute(spec).await?;
        response.expect_status(StatusCode::OK)?.json()
    }

    /// Identifier at position `index` of the most recent page.
    pub fn resolve_selection(&self, index: i64) -> Result<ItemId, ClientError> {
        let index_map = self.cache.load(&self.index_key)?;
        Ok(index_map.resolve(index)?)
    }

    /// Identifier of the item rendered as row number `row`.
    pub fn resolve_row(&self, row: i64) -> Result<ItemId, ClientError> {
        let index_map = self.cache.load(&self.index_key)?;
        Ok(index_map.resolve_row(row)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ids(n: usize) -> Vec<ItemId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_cursor_advance_saturates() {
        let cursor = PageCursor::first(u32::MAX / 2 + 1).advanced();
        assert_eq!(cursor.offset, u32::MAX / 2 + 1);

        let cursor = cursor.advanced();
        assert_eq!(cursor.offset, u32::MAX);
        assert_eq!(cursor.advanced().offset, u32::MAX);
    }

    #[test]
    fn test_cursor_advance_keeps_filter() {
        let mut filter = BTreeMap::new();
        filter.insert("author".to_string(), "Tolkien".to_string());
        let cursor = PageCursor::first(10).with_filter(filter.clone());

        let next = cursor.advanced();
        assert_eq!(next.offset, 10);
        assert_eq!(next.limit, 10);
        assert_eq!(next.filter, filter);
        assert_eq!(next.advanced().offset, 20);
        assert_eq!(next.page_number(), 2);
    }

    #[test]
    fn test_cursor_query_params() {
        let mut filter = BTreeMap::new();
        filter.insert("genre".to_string(), "poetry".to_string());
        let params = PageCursor::first(10).advanced().with_filter(filter).query_params();

        assert_eq!(params.get("limit").map(String::as_str), Some("10"));
        assert_eq!(params.get("offset").map(String::as_str), Some("10"));
        assert_eq!(params.get("genre").map(String::as_str), Some("poetry"));
    }

    #[test]
    fn test_index_map_resolve_bounds() {
        let ids = ids(10);
        let map = IndexMap::new(ids.clone(), 0);

        for (i, id) in ids.iter().enumerate() {
            assert_eq!(map.resolve(i as i64), Ok(*id));
        }
        assert_eq!(
            map.resolve(10),
            Err(SelectionError::OutOfRange { index: 10, len: 10 })
        );
        assert_eq!(
            map.resolve(-1),
            Err(SelectionError::OutOfRange { index: -1, len: 10 })
        );
        assert!(map.resolve(15).is_err());
    }

    #[test]
    fn test_index_map_resolve_row() {
        let ids = ids(2);
        let map = IndexMap::new(ids.clone(), 10);

        assert_eq!(map.resolve_row(10), Ok(ids[0]));
        assert_eq!(map.resolve_row(11), Ok(ids[1]));
        assert_eq!(map.resolve_row(12), Err(SelectionError::RowOutOfRange { row: 12 }));
        assert_eq!(map.resolve_row(9), Err(SelectionError::RowOutOfRange { row: 9 }));
    }

    #[test]
    fn test_empty_index_map() {
        let map = IndexMap::default();
        assert!(map.is_empty());
        assert!(map.resolve(0).is_err());
    }
}
