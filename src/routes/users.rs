use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{AuthUser, ContentPreference, GenreTag, UserProfile},
    routes::{
        extract::{require_non_blank, Validate, ValidJson},
        AppState, MessageResponse,
    },
    services::{
        accounts::{NewAccount, Session},
        recommendations::MAX_SOURCES,
    },
};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_HANDLE_LEN: usize = 32;
/// Leaves room for the popularity fallback; a full source list would make
/// the recommendation loop exit before its first query
pub const MAX_PREFERRED_GENRES: usize = MAX_SOURCES - 1;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub handle: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub genres: Vec<GenreTag>,
    #[serde(default)]
    pub content_preference: ContentPreference,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> AppResult<()> {
        require_non_blank("name", &self.name)?;

        let handle_ok = !self.handle.is_empty()
            && self.handle.len() <= MAX_HANDLE_LEN
            && self
                .handle
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !handle_ok {
            return Err(AppError::InvalidInput(format!(
                "handle must be 1-{} letters, digits, '_' or '-'",
                MAX_HANDLE_LEN
            )));
        }

        let email_ok = matches!(
            self.email.split_once('@'),
            Some((local, domain)) if !local.is_empty() && domain.contains('.')
        );
        if !email_ok {
            return Err(AppError::InvalidInput("email is not valid".to_string()));
        }

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        validate_genres(&self.genres)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> AppResult<()> {
        require_non_blank("login", &self.login)?;
        require_non_blank("password", &self.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateGenresRequest {
    pub genres: Vec<GenreTag>,
}

impl Validate for UpdateGenresRequest {
    fn validate(&self) -> AppResult<()> {
        validate_genres(&self.genres)
    }
}

fn validate_genres(genres: &[GenreTag]) -> AppResult<()> {
    if genres.len() > MAX_PREFERRED_GENRES {
        return Err(AppError::InvalidInput(format!(
            "at most {} genres can be selected",
            MAX_PREFERRED_GENRES
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub token: String,
    pub user: UserProfile,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            success: true,
            token: session.token,
            user: UserProfile::from(&session.user),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserProfile,
}

/// POST /users/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<SessionResponse>)> {
    let session = state
        .accounts
        .register(NewAccount {
            name: request.name.trim().to_string(),
            handle: request.handle,
            email: request.email.trim().to_lowercase(),
            password: request.password,
            genres: request.genres,
            content_preference: request.content_preference,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /users/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let session = state
        .accounts
        .login(request.login.trim(), &request.password)
        .await?;
    Ok(Json(session.into()))
}

/// GET /users/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state.accounts.profile(user.user_id).await?;
    Ok(Json(ProfileResponse {
        success: true,
        user: UserProfile::from(&profile),
    }))
}

/// PUT /users/genres
pub async fn update_genres(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(request): ValidJson<UpdateGenresRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .accounts
        .update_genres(user.user_id, request.genres)
        .await?;
    Ok(Json(MessageResponse::ok("Preferred genres updated")))
}
