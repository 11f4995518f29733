use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{CatalogItem, DiscoverFilters},
    services::catalog::CatalogClient,
};

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const ITEM_CACHE_TTL: u64 = 86400; // 1 day
const POPULAR_CACHE_TTL: u64 = 1800; // 30 minutes

/// Read-through Redis cache in front of another catalog client.
///
/// Title search, lookup by ID and the popular list are served from Redis
/// when present and written back in the background on a miss. Discovery is
/// passed through uncached so recommendation runs always see live results
/// and live failures.
///
/// The cache is optional: when Redis cannot be read, every call goes
/// straight to the wrapped client.
pub struct CachedCatalog {
    inner: Arc<dyn CatalogClient>,
    cache: Cache,
}

impl CachedCatalog {
    /// Wraps `inner` with the given cache
    ///
    /// The cache's writer task must stay alive for as long as this client
    /// is used; see `CacheWriterHandle`.
    pub fn new(inner: Arc<dyn CatalogClient>, cache: Cache) -> Self {
        tracing::info!(provider = inner.name(), "Catalog responses will be cached");
        Self { inner, cache }
    }
}

#[async_trait::async_trait]
impl CatalogClient for CachedCatalog {
    async fn search_by_title(&self, title: &str) -> AppResult<Vec<CatalogItem>> {
        if title.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search title cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::CatalogSearch(title.to_string()),
            SEARCH_CACHE_TTL,
            self.inner.search_by_title(title)
        )
    }

    async fn get_by_id(&self, id: u64) -> AppResult<CatalogItem> {
        cached!(
            self.cache,
            CacheKey::CatalogItem(id),
            ITEM_CACHE_TTL,
            self.inner.get_by_id(id)
        )
    }

    async fn discover(&self, filters: &DiscoverFilters) -> AppResult<Vec<CatalogItem>> {
        self.inner.discover(filters).await
    }

    async fn popular(&self) -> AppResult<Vec<CatalogItem>> {
        cached!(
            self.cache,
            CacheKey::Popular,
            POPULAR_CACHE_TTL,
            self.inner.popular()
        )
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
