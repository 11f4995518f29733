use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

pub mod catalog;
pub mod collection;
pub mod extract;
pub mod recommendations;
pub mod state;
pub mod users;

pub use state::{AppState, StateParts};

/// `{success, message}` body returned by mutating endpoints
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/movies", movie_routes())
        .nest("/users", user_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

fn movie_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(catalog::search))
        .route("/search-by-id", post(catalog::search_by_id))
        .route("/popular", get(catalog::popular))
        .route("/recommendations", get(recommendations::recommend))
        .route(
            "/collection",
            get(collection::get_collection)
                .post(collection::add_item)
                .delete(collection::remove_item),
        )
        .route("/collection/status", put(collection::update_status))
}

fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/me", get(users::me))
        .route("/genres", put(users::update_genres))
}

async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
