/// Movie catalog abstraction
///
/// The service only ever talks to the external catalog through this trait.
/// `TmdbCatalog` is the live implementation; `CachedCatalog` decorates any
/// implementation with a Redis read-through cache.
use crate::{
    error::AppResult,
    models::{CatalogItem, DiscoverFilters},
};

pub mod cached;
pub mod tmdb;

pub use cached::CachedCatalog;
pub use tmdb::TmdbCatalog;

/// Outbound calls to the movie catalog.
///
/// Every method performs at most one upstream request. Failures (network or
/// non-2xx) are returned as-is; nothing here retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// Search movies by title
    async fn search_by_title(&self, title: &str) -> AppResult<Vec<CatalogItem>>;

    /// Fetch one movie by its catalog ID
    async fn get_by_id(&self, id: u64) -> AppResult<CatalogItem>;

    /// Filtered discovery, first page only
    async fn discover(&self, filters: &DiscoverFilters) -> AppResult<Vec<CatalogItem>>;

    /// Currently popular movies, most popular first
    async fn popular(&self) -> AppResult<Vec<CatalogItem>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Orders items by descending popularity, keeping provider order for ties
pub fn sort_by_popularity(items: &mut [CatalogItem]) {
    items.sort_by(|a, b| {
        b.popularity
            .partial_cmp(&a.popularity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
