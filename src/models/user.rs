use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A genre reference carrying the catalog's numeric genre ID
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenreTag {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl GenreTag {
    pub fn new(id: u64) -> Self {
        Self { id, name: None }
    }

    /// ID 0 is never a real catalog genre
    pub fn is_empty(&self) -> bool {
        self.id == 0
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Kind of content the user wants to see
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentPreference {
    Movies,
    Tv,
    #[default]
    Both,
}

/// A registered user, including credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub handle: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub content_preference: ContentPreference,
    pub genres: Vec<GenreTag>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Genre tags usable for discovery, in preference order
    pub fn preferred_genres(&self) -> Vec<GenreTag> {
        self.genres
            .iter()
            .filter(|g| !g.is_empty())
            .cloned()
            .collect()
    }
}

/// User profile as exposed over HTTP
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub handle: String,
    pub email: String,
    pub role: Role,
    pub content_preference: ContentPreference,
    pub genres: Vec<GenreTag>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            handle: user.handle.clone(),
            email: user.email.clone(),
            role: user.role,
            content_preference: user.content_preference,
            genres: user.genres.clone(),
            created_at: user.created_at,
        }
    }
}

/// Bearer token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: Uuid,
    pub handle: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Identity of the caller, resolved from a verified token
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub handle: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            handle: claims.handle,
            role: claims.role,
        }
    }
}
