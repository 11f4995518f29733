use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{ContentPreference, GenreTag, Role, User},
};

/// Persistence for registered users.
///
/// Handles and emails are unique case-insensitively; `insert` fails with
/// `AppError::Conflict` when either is taken.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> AppResult<()>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Looks a user up by handle or email
    async fn find_by_login(&self, login: &str) -> AppResult<Option<User>>;

    /// Replaces the preferred genre list; returns false if the user is unknown
    async fn update_genres(&self, id: Uuid, genres: &[GenreTag]) -> AppResult<bool>;
}

fn duplicate_user() -> AppError {
    AppError::Conflict("Handle or email is already registered".to_string())
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.write().await;

        let taken = users.values().any(|u| {
            u.handle.eq_ignore_ascii_case(&user.handle) || u.email.eq_ignore_ascii_case(&user.email)
        });
        if taken {
            return Err(duplicate_user());
        }

        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.handle.eq_ignore_ascii_case(login) || u.email.eq_ignore_ascii_case(login))
            .cloned())
    }

    async fn update_genres(&self, id: Uuid, genres: &[GenreTag]) -> AppResult<bool> {
        match self.users.write().await.get_mut(&id) {
            Some(user) => {
                user.genres = genres.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    handle: String,
    email: String,
    password_hash: String,
    role: String,
    content_preference: String,
    genres: Json<Vec<GenreTag>>,
    created_at: DateTime<Utc>,
}

fn parse_role(value: &str) -> Role {
    match value {
        "admin" => Role::Admin,
        _ => Role::User,
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::User => "user",
    }
}

fn parse_content_preference(value: &str) -> ContentPreference {
    match value {
        "movies" => ContentPreference::Movies,
        "tv" => ContentPreference::Tv,
        _ => ContentPreference::Both,
    }
}

fn content_preference_str(pref: ContentPreference) -> &'static str {
    match pref {
        ContentPreference::Movies => "movies",
        ContentPreference::Tv => "tv",
        ContentPreference::Both => "both",
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            handle: row.handle,
            email: row.email,
            password_hash: row.password_hash,
            role: parse_role(&row.role),
            content_preference: parse_content_preference(&row.content_preference),
            genres: row.genres.0,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, name, handle, email, password_hash, role, content_preference, genres, created_at";

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &User) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users
                (id, name, handle, email, password_hash, role, content_preference, genres, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.handle)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(role_str(user.role))
        .bind(content_preference_str(user.content_preference))
        .bind(Json(&user.genres))
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(duplicate_user()),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_login(&self, login: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(handle) = lower($1) OR lower(email) = lower($1)"
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn update_genres(&self, id: Uuid, genres: &[GenreTag]) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET genres = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(genres))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
