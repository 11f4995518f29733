use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::CatalogItem,
    routes::{
        extract::{require_catalog_id, require_non_blank, Validate, ValidJson},
        AppState,
    },
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchByIdRequest {
    pub id: u64,
}

impl Validate for SearchByIdRequest {
    fn validate(&self) -> AppResult<()> {
        require_catalog_id("id", self.id)
    }
}

/// GET /movies/search?title=
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<CatalogItem>>> {
    require_non_blank("title", &params.title)?;

    let items = state.catalog.search_by_title(params.title.trim()).await?;
    Ok(Json(items))
}

/// POST /movies/search-by-id
pub async fn search_by_id(
    State(state): State<Arc<AppState>>,
    ValidJson(request): ValidJson<SearchByIdRequest>,
) -> AppResult<Json<CatalogItem>> {
    let item = state.catalog.get_by_id(request.id).await?;
    Ok(Json(item))
}

/// GET /movies/popular
pub async fn popular(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<CatalogItem>>> {
    let items = state.catalog.popular().await?;
    Ok(Json(items))
}
