use std::sync::Arc;
use std::time::Duration;

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use cinelog_api::{
    db::{InMemoryCollectionStore, InMemoryUserStore},
    error::{AppError, AppResult},
    models::{CatalogItem, DiscoverFilters},
    routes::{create_router, AppState, StateParts},
    services::{recommendations::FanOutPolicy, AuthGateway, CatalogClient},
};

fn movie(id: u64, title: &str, genre: u64, popularity: f64) -> CatalogItem {
    CatalogItem {
        id,
        title: title.to_string(),
        poster_path: Some(format!("/{}.jpg", id)),
        genre_ids: vec![genre],
        popularity,
        overview: None,
        release_date: None,
        vote_average: Some(7.8),
        vote_count: Some(4000),
    }
}

/// Catalog stand-in serving ten action movies (IDs 1..=10, genre 28)
/// and three comedies (IDs 50..=52, genre 35)
#[derive(Default)]
struct StubCatalog {
    /// Every discovery call fails
    fail_discovery: bool,
    /// Discovery for this one genre fails
    failing_genre: Option<u64>,
}

impl StubCatalog {
    fn movies() -> Vec<CatalogItem> {
        let mut movies: Vec<CatalogItem> = (1..=10)
            .map(|id| movie(id, &format!("Action {}", id), 28, 100.0 - id as f64))
            .collect();
        movies.push(movie(50, "Comedy A", 35, 20.0));
        movies.push(movie(51, "Comedy B", 35, 95.5));
        movies.push(movie(52, "Comedy C", 35, 60.0));
        movies
    }
}

#[async_trait::async_trait]
impl CatalogClient for StubCatalog {
    async fn search_by_title(&self, title: &str) -> AppResult<Vec<CatalogItem>> {
        let needle = title.to_lowercase();
        Ok(Self::movies()
            .into_iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .collect())
    }

    async fn get_by_id(&self, id: u64) -> AppResult<CatalogItem> {
        Self::movies()
            .into_iter()
            .find(|m| m.id == id)
            .ok_or_else(|| AppError::NotFound("Catalog movie not found".to_string()))
    }

    async fn discover(&self, filters: &DiscoverFilters) -> AppResult<Vec<CatalogItem>> {
        let genre_fails = filters.genre_id.is_some() && filters.genre_id == self.failing_genre;
        if self.fail_discovery || genre_fails {
            return Err(AppError::ExternalApi("catalog unreachable".to_string()));
        }
        Ok(Self::movies()
            .into_iter()
            .filter(|m| match filters.genre_id {
                Some(genre) => m.genre_ids.contains(&genre),
                None => true,
            })
            .collect())
    }

    async fn popular(&self) -> AppResult<Vec<CatalogItem>> {
        let mut movies = Self::movies();
        movies.sort_by(|a, b| b.popularity.partial_cmp(&a.popularity).unwrap());
        Ok(movies)
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

fn create_test_server_with(catalog: StubCatalog, fan_out: FanOutPolicy) -> TestServer {
    let state = AppState::new(StateParts {
        catalog: Arc::new(catalog),
        collection_store: Arc::new(InMemoryCollectionStore::new()),
        user_store: Arc::new(InMemoryUserStore::new()),
        auth: AuthGateway::new("integration-secret", 3600),
        fan_out,
        recommendation_timeout: Duration::from_secs(5),
    });
    TestServer::new(create_router(Arc::new(state))).unwrap()
}

fn create_test_server() -> TestServer {
    create_test_server_with(StubCatalog::default(), FanOutPolicy::AllOrNothing)
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

async fn register(server: &TestServer, handle: &str, genres: Value) -> String {
    let response = server
        .post("/users/register")
        .json(&json!({
            "name": "Test User",
            "handle": handle,
            "email": format!("{}@example.com", handle),
            "password": "correct-horse",
            "genres": genres
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let id = "6f1d8c5e-2b7a-4c11-9d0e-3a5b7c9d1e2f";

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static(id),
        )
        .await;

    assert_eq!(response.header("x-request-id"), id);
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let server = create_test_server();
    register(&server, "deckard", json!([{ "id": 878, "name": "Science Fiction" }])).await;

    let response = server
        .post("/users/login")
        .json(&json!({ "login": "deckard", "password": "correct-horse" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let token = body["token"].as_str().unwrap();

    let response = server
        .get("/users/me")
        .add_header(AUTHORIZATION, bearer(token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["handle"], "deckard");
    assert_eq!(body["user"]["genres"][0]["id"], 878);
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let server = create_test_server();
    register(&server, "rachael", json!([])).await;

    let response = server
        .post("/users/register")
        .json(&json!({
            "name": "Other",
            "handle": "Rachael",
            "email": "other@example.com",
            "password": "correct-horse"
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_bad_login_is_unauthorized() {
    let server = create_test_server();
    register(&server, "gaff", json!([])).await;

    let response = server
        .post("/users/login")
        .json(&json!({ "login": "gaff", "password": "unicorn!!" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_collection_requires_token() {
    let server = create_test_server();

    let response = server.get("/movies/collection").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/movies/collection")
        .add_header(AUTHORIZATION, bearer("forged.token.value"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_collection_flow() {
    let server = create_test_server();
    let token = register(&server, "roy", json!([])).await;

    // No collection until the first add
    let response = server
        .get("/movies/collection")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server
        .post("/movies/collection")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({
            "id": 78,
            "posterPath": "/br.jpg",
            "title": "Blade Runner",
            "genres": [{ "id": 878 }]
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let response = server
        .post("/movies/collection")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "id": 335984, "title": "Blade Runner" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = server
        .get("/movies/collection")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    let movies = body["movies"].as_array().unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0]["id"], 78);
    assert_eq!(movies[0]["posterPath"], "/br.jpg");
    assert_eq!(movies[0]["status"], "to-watch");

    let response = server
        .put("/movies/collection/status")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "movieId": 78, "status": "watched" }))
        .await;
    response.assert_status_ok();

    let response = server
        .put("/movies/collection/status")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "movieId": 999, "status": "watched" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server
        .get("/movies/collection")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["movies"][0]["status"], "watched");

    let response = server
        .delete("/movies/collection")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "movieId": 78 }))
        .await;
    response.assert_status_ok();

    let response = server
        .delete("/movies/collection")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "movieId": 78 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_bodies_are_rejected() {
    let server = create_test_server();
    let token = register(&server, "pris", json!([])).await;

    let response = server
        .post("/movies/collection")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "id": 1, "title": "  " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .put("/movies/collection/status")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "movieId": 1, "status": "binged" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_search_and_lookup() {
    let server = create_test_server();

    let response = server.get("/movies/search").add_query_param("title", "comedy").await;
    response.assert_status_ok();
    let results: Vec<Value> = response.json();
    assert_eq!(results.len(), 3);

    let response = server.get("/movies/search").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/movies/search-by-id")
        .json(&json!({ "id": 51 }))
        .await;
    response.assert_status_ok();
    let item: Value = response.json();
    assert_eq!(item["title"], "Comedy B");

    let response = server
        .post("/movies/search-by-id")
        .json(&json!({ "id": 4242 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_popular_is_sorted() {
    let server = create_test_server();

    let response = server.get("/movies/popular").await;
    response.assert_status_ok();
    let items: Vec<Value> = response.json();
    let popularity: Vec<f64> = items
        .iter()
        .map(|i| i["popularity"].as_f64().unwrap())
        .collect();
    assert!(popularity.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_recommendations_exclude_saved_items() {
    let server = create_test_server();
    let token = register(&server, "leon", json!([{ "id": 28 }])).await;

    server
        .post("/movies/collection")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "id": 3, "title": "Action 3" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .get("/movies/recommendations")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("x-recommendations-degraded"), "false");

    let items: Vec<CatalogItem> = response.json();
    let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 2, 4, 5, 6, 7, 8, 9, 10]);
}

#[tokio::test]
async fn test_recommendations_without_genres_is_bad_request() {
    let server = create_test_server();
    let token = register(&server, "zhora", json!([])).await;

    let response = server
        .get("/movies/recommendations")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "No recommendations found");
}

#[tokio::test]
async fn test_recommendations_upstream_failure_is_bad_gateway() {
    let server = create_test_server_with(
        StubCatalog {
            fail_discovery: true,
            ..Default::default()
        },
        FanOutPolicy::AllOrNothing,
    );
    let token = register(&server, "batty", json!([{ "id": 28 }])).await;

    let response = server
        .get("/movies/recommendations")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_one_failing_genre_fails_recommendations_by_default() {
    let server = create_test_server_with(
        StubCatalog {
            failing_genre: Some(35),
            ..Default::default()
        },
        FanOutPolicy::AllOrNothing,
    );
    let token = register(&server, "rachael", json!([{ "id": 28 }, { "id": 35 }])).await;

    let response = server
        .get("/movies/recommendations")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_tolerant_fan_out_flags_degraded_recommendations() {
    let server = create_test_server_with(
        StubCatalog {
            failing_genre: Some(35),
            ..Default::default()
        },
        FanOutPolicy::TolerateFailures,
    );
    let token = register(&server, "deckard", json!([{ "id": 28 }, { "id": 35 }])).await;

    let response = server
        .get("/movies/recommendations")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("x-recommendations-degraded"), "true");

    let items: Vec<CatalogItem> = response.json();
    let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_updated_genres_drive_recommendations() {
    let server = create_test_server();
    let token = register(&server, "tyrell", json!([])).await;

    server
        .put("/users/genres")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "genres": [{ "id": 35 }] }))
        .await
        .assert_status_ok();

    let response = server
        .get("/movies/recommendations")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();
    let items: Vec<CatalogItem> = response.json();
    assert_eq!(&items.iter().map(|i| i.id).collect::<Vec<_>>()[..3], &[50, 51, 52]);
}
