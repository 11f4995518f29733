use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::UserStore,
    error::{AppError, AppResult},
    models::{ContentPreference, GenreTag, Role, User},
    services::auth::{hash_password, verify_password, AuthGateway},
};

/// Data needed to create an account, already validated at the boundary
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub handle: String,
    pub email: String,
    pub password: String,
    pub genres: Vec<GenreTag>,
    pub content_preference: ContentPreference,
}

/// A user together with a freshly issued token
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Registration, login and profile updates
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    auth: AuthGateway,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, auth: AuthGateway) -> Self {
        Self { users, auth }
    }

    /// Creates an account and signs the user in.
    ///
    /// The password is hashed before it reaches the store. Handle and email
    /// uniqueness is enforced by the store, which reports a clash as
    /// `Conflict`.
    pub async fn register(&self, account: NewAccount) -> AppResult<Session> {
        let user = User {
            id: Uuid::new_v4(),
            name: account.name,
            handle: account.handle,
            email: account.email,
            password_hash: hash_password(&account.password)?,
            role: Role::User,
            content_preference: account.content_preference,
            genres: account.genres,
            created_at: Utc::now(),
        };

        self.users.insert(&user).await?;
        tracing::info!(user_id = %user.id, handle = %user.handle, "User registered");

        let token = self.auth.issue(&user)?;
        Ok(Session { user, token })
    }

    /// Checks credentials and issues a token.
    ///
    /// `login` is either the handle or the email address. An unknown user
    /// and a wrong password produce the same `Unauthorized` error.
    pub async fn login(&self, login: &str, password: &str) -> AppResult<Session> {
        let user = self
            .users
            .find_by_login(login)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "Login rejected");
            return Err(invalid_credentials());
        }

        let token = self.auth.issue(&user)?;
        Ok(Session { user, token })
    }

    pub async fn profile(&self, user_id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Replaces the preferred-genre list used for recommendations
    pub async fn update_genres(&self, user_id: Uuid, genres: Vec<GenreTag>) -> AppResult<()> {
        if !self.users.update_genres(user_id, &genres).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tracing::info!(user_id = %user_id, genres = genres.len(), "Preferred genres updated");
        Ok(())
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryUserStore;

    fn service() -> AccountService {
        AccountService::new(
            Arc::new(InMemoryUserStore::new()),
            AuthGateway::new("test-secret", 3600),
        )
    }

    fn account(handle: &str) -> NewAccount {
        NewAccount {
            name: "Dana Scully".into(),
            handle: handle.into(),
            email: format!("{}@example.com", handle),
            password: "trustno1".into(),
            genres: vec![GenreTag::new(878)],
            content_preference: ContentPreference::Tv,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service();
        let registered = service.register(account("scully")).await.unwrap();
        assert!(!registered.token.is_empty());
        assert_ne!(registered.user.password_hash, "trustno1");

        let by_handle = service.login("scully", "trustno1").await.unwrap();
        let by_email = service
            .login("scully@example.com", "trustno1")
            .await
            .unwrap();
        assert_eq!(by_handle.user.id, registered.user.id);
        assert_eq!(by_email.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let service = service();
        service.register(account("mulder")).await.unwrap();

        let wrong = service.login("mulder", "password").await.unwrap_err();
        let unknown = service.login("skinner", "trustno1").await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let service = service();
        service.register(account("mulder")).await.unwrap();
        let err = service.register(account("mulder")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_genres() {
        let service = service();
        let session = service.register(account("doggett")).await.unwrap();

        service
            .update_genres(session.user.id, vec![GenreTag::new(80), GenreTag::new(53)])
            .await
            .unwrap();

        let user = service.profile(session.user.id).await.unwrap();
        assert_eq!(user.genres, vec![GenreTag::new(80), GenreTag::new(53)]);

        let err = service
            .update_genres(Uuid::new_v4(), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
