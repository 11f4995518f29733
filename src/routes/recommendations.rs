use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::{error::AppResult, middleware::RequestId, models::AuthUser, routes::AppState};

/// Response header set to `true` when some genre lookups failed and the
/// list was built from the remaining ones
pub const DEGRADED_HEADER: &str = "x-recommendations-degraded";

/// GET /movies/recommendations
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    request_id: RequestId,
) -> AppResult<impl IntoResponse> {
    let profile = state.accounts.profile(user.user_id).await?;
    let genres = profile.preferred_genres();

    tracing::info!(
        request_id = %request_id,
        user_id = %user.user_id,
        genre_count = genres.len(),
        "Building recommendations"
    );

    let recommendations = state
        .recommendations
        .recommend(user.user_id, &genres)
        .await?;

    let degraded = if recommendations.degraded { "true" } else { "false" };
    Ok(([(DEGRADED_HEADER, degraded)], Json(recommendations.items)))
}
