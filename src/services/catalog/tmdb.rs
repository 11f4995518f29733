/// TMDB catalog client
///
/// Endpoints used:
/// 1. Search: /search/movie?query=
/// 2. Details: /movie/{id}
/// 3. Discovery: /discover/movie with query-string filters
/// 4. Popular: /movie/popular
///
/// Authentication is the `api_key` query parameter.
use std::time::Duration;

use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogItem, CatalogItemDetails, CatalogPage, DiscoverFilters},
    services::catalog::{sort_by_popularity, CatalogClient},
};

const PROVIDER_NAME: &str = "tmdb";

/// Catalog client for The Movie Database v3 API
///
/// Authenticates with an `api_key` query parameter. Each call makes exactly
/// one request and never retries.
#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbCatalog {
    /// Builds a client whose every request is bounded by `timeout`
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Internal("TMDB API key is not configured".to_string()));
        }

        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http_client
            .get(format!("{}{}", self.api_url, path))
            .query(&[("api_key", self.api_key.as_str())])
    }

    /// Sends the request and decodes a 2xx JSON body
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> AppResult<T> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, request = %what, provider = PROVIDER_NAME, "Catalog request failed");
            if e.is_timeout() {
                AppError::UpstreamTimeout(format!("Catalog {} timed out", what))
            } else {
                AppError::HttpClient(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Catalog {} not found", what)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                request = %what,
                provider = PROVIDER_NAME,
                "Catalog API returned an error"
            );
            return Err(AppError::ExternalApi(format!(
                "Catalog API returned status {}: {}",
                status, body
            )));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::ExternalApi(format!("Failed to parse catalog {} response: {}", what, e))
        })
    }
}

#[async_trait::async_trait]
impl CatalogClient for TmdbCatalog {
    async fn search_by_title(&self, title: &str) -> AppResult<Vec<CatalogItem>> {
        let request = self.get("/search/movie").query(&[("query", title)]);
        let page: CatalogPage = self.fetch(request, "search").await?;

        tracing::info!(
            title = %title,
            results = page.results.len(),
            provider = PROVIDER_NAME,
            "Title search completed"
        );

        Ok(page.results)
    }

    async fn get_by_id(&self, id: u64) -> AppResult<CatalogItem> {
        let request = self.get(&format!("/movie/{}", id));
        let details: CatalogItemDetails = self.fetch(request, "movie").await?;
        Ok(details.into())
    }

    async fn discover(&self, filters: &DiscoverFilters) -> AppResult<Vec<CatalogItem>> {
        let request = self.get("/discover/movie").query(&filters.to_query());
        let page: CatalogPage = self.fetch(request, "discovery").await?;

        tracing::debug!(
            genre_id = ?filters.genre_id,
            results = page.results.len(),
            total = page.total_results,
            "Discovery completed"
        );

        Ok(page.results)
    }

    async fn popular(&self) -> AppResult<Vec<CatalogItem>> {
        let request = self.get("/movie/popular").query(&[("page", "1")]);
        let page: CatalogPage = self.fetch(request, "popular").await?;

        let mut items = page.results;
        sort_by_popularity(&mut items);
        Ok(items)
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
