use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Collection, SavedItem},
};

/// Outcome of a conditional collection write
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Stored; carries the collection with its new version
    Saved(Collection),
    /// Another writer got there first; the caller should re-read
    Stale,
}

/// Persistence for per-user collection documents.
///
/// Writes are compare-and-swap on `Collection::version`: a write succeeds
/// only if the stored version still equals the version the caller read
/// (0 meaning "no document stored yet").
#[async_trait::async_trait]
pub trait CollectionStore: Send + Sync {
    async fn load(&self, user_id: Uuid) -> AppResult<Option<Collection>>;

    async fn save(&self, collection: &Collection) -> AppResult<SaveOutcome>;
}

/// Process-local store used for development and tests
#[derive(Default)]
pub struct InMemoryCollectionStore {
    collections: RwLock<HashMap<Uuid, Collection>>,
}

impl InMemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CollectionStore for InMemoryCollectionStore {
    async fn load(&self, user_id: Uuid) -> AppResult<Option<Collection>> {
        Ok(self.collections.read().await.get(&user_id).cloned())
    }

    async fn save(&self, collection: &Collection) -> AppResult<SaveOutcome> {
        let mut collections = self.collections.write().await;

        let stored_version = collections
            .get(&collection.user_id)
            .map(|c| c.version)
            .unwrap_or(0);

        if stored_version != collection.version {
            return Ok(SaveOutcome::Stale);
        }

        let mut saved = collection.clone();
        saved.version += 1;
        saved.updated_at = Utc::now();
        collections.insert(saved.user_id, saved.clone());

        Ok(SaveOutcome::Saved(saved))
    }
}

#[derive(sqlx::FromRow)]
struct CollectionRow {
    user_id: Uuid,
    items: Json<Vec<SavedItem>>,
    version: i64,
    updated_at: DateTime<Utc>,
}

impl From<CollectionRow> for Collection {
    fn from(row: CollectionRow) -> Self {
        Collection {
            user_id: row.user_id,
            items: row.items.0,
            version: row.version,
            updated_at: row.updated_at,
        }
    }
}

/// Postgres-backed store; one JSONB document per user
#[derive(Clone)]
pub struct PgCollectionStore {
    pool: PgPool,
}

impl PgCollectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CollectionStore for PgCollectionStore {
    async fn load(&self, user_id: Uuid) -> AppResult<Option<Collection>> {
        let row = sqlx::query_as::<_, CollectionRow>(
            r#"
            SELECT user_id, items, version, updated_at
            FROM collections
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Collection::from))
    }

    async fn save(&self, collection: &Collection) -> AppResult<SaveOutcome> {
        let row = if collection.version == 0 {
            sqlx::query_as::<_, CollectionRow>(
                r#"
                INSERT INTO collections (user_id, items, version, updated_at)
                VALUES ($1, $2, 1, NOW())
                ON CONFLICT (user_id) DO NOTHING
                RETURNING user_id, items, version, updated_at
                "#,
            )
            .bind(collection.user_id)
            .bind(Json(&collection.items))
            .fetch_optional(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, CollectionRow>(
                r#"
                UPDATE collections
                SET items = $2, version = version + 1, updated_at = NOW()
                WHERE user_id = $1 AND version = $3
                RETURNING user_id, items, version, updated_at
                "#,
            )
            .bind(collection.user_id)
            .bind(Json(&collection.items))
            .bind(collection.version)
            .fetch_optional(&self.pool)
            .await?
        };

        match row {
            Some(row) => Ok(SaveOutcome::Saved(row.into())),
            None => {
                tracing::debug!(
                    user_id = %collection.user_id,
                    version = collection.version,
                    "Collection write lost a version race"
                );
                Ok(SaveOutcome::Stale)
            }
        }
    }
}

/// Turns a lost race that exhausted its retries into a client-facing error
pub fn stale_write_error(user_id: Uuid) -> AppError {
    tracing::warn!(user_id = %user_id, "Collection write retries exhausted");
    AppError::Conflict("Collection was modified concurrently, please retry".to_string())
}
