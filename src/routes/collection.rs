use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{AuthUser, GenreTag, SavedItem, WatchStatus},
    routes::{
        extract::{require_catalog_id, require_non_blank, Validate, ValidJson},
        AppState, MessageResponse,
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<GenreTag>,
}

impl Validate for AddItemRequest {
    fn validate(&self) -> AppResult<()> {
        require_catalog_id("id", self.id)?;
        require_non_blank("title", &self.title)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub movie_id: u64,
    pub status: WatchStatus,
}

impl Validate for UpdateStatusRequest {
    fn validate(&self) -> AppResult<()> {
        require_catalog_id("movieId", self.movie_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    pub movie_id: u64,
}

impl Validate for RemoveItemRequest {
    fn validate(&self) -> AppResult<()> {
        require_catalog_id("movieId", self.movie_id)
    }
}

#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    pub success: bool,
    pub movies: Vec<SavedItem>,
}

/// GET /movies/collection
pub async fn get_collection(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<CollectionResponse>> {
    let movies = state.collections.get(user.user_id).await?;
    Ok(Json(CollectionResponse {
        success: true,
        movies,
    }))
}

/// POST /movies/collection
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    request_id: RequestId,
    ValidJson(request): ValidJson<AddItemRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    tracing::info!(
        request_id = %request_id,
        user_id = %user.user_id,
        item_id = request.id,
        "Adding item to collection"
    );

    let item = SavedItem::new(
        request.id,
        request.title.trim().to_string(),
        request.poster_path,
        request.genres,
    );
    state.collections.add(user.user_id, item).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("Movie added to collection")),
    ))
}

/// PUT /movies/collection/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(request): ValidJson<UpdateStatusRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .collections
        .update_status(user.user_id, request.movie_id, request.status)
        .await?;

    Ok(Json(MessageResponse::ok("Movie status updated")))
}

/// DELETE /movies/collection
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(request): ValidJson<RemoveItemRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .collections
        .remove(user.user_id, request.movie_id)
        .await?;

    Ok(Json(MessageResponse::ok("Movie removed from collection")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_request_validation() {
        let valid: AddItemRequest = serde_json::from_str(
            r#"{"id": 603, "title": "The Matrix", "posterPath": "/m.jpg", "genres": [{"id": 28}]}"#,
        )
        .unwrap();
        assert!(valid.validate().is_ok());
        assert_eq!(valid.poster_path.as_deref(), Some("/m.jpg"));

        let blank: AddItemRequest =
            serde_json::from_str(r#"{"id": 603, "title": "   "}"#).unwrap();
        assert!(blank.validate().is_err());

        let zero: AddItemRequest = serde_json::from_str(r#"{"id": 0, "title": "X"}"#).unwrap();
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_status_request_rejects_unknown_status() {
        let parsed = serde_json::from_str::<UpdateStatusRequest>(
            r#"{"movieId": 603, "status": "binged"}"#,
        );
        assert!(parsed.is_err());
    }
}
