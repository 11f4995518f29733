use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{collections::stale_write_error, CollectionStore, SaveOutcome},
    error::{AppError, AppResult},
    models::{Collection, SavedItem, WatchStatus},
};

/// Attempts per mutation before a lost version race is reported
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// CRUD over a single user's collection.
///
/// Every mutation re-reads the whole document, applies the change and
/// writes it back conditionally on the version it read. A concurrent writer
/// makes the write stale, in which case the mutation is replayed against a
/// fresh read.
#[derive(Clone)]
pub struct CollectionManager {
    store: Arc<dyn CollectionStore>,
}

impl CollectionManager {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    /// Saved items in insertion order
    pub async fn get(&self, user_id: Uuid) -> AppResult<Vec<SavedItem>> {
        self.store
            .load(user_id)
            .await?
            .map(|c| c.items)
            .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))
    }

    /// External IDs the user has saved; empty when there is no collection yet
    pub async fn saved_ids(&self, user_id: Uuid) -> AppResult<HashSet<u64>> {
        Ok(self
            .store
            .load(user_id)
            .await?
            .map(|c| c.saved_ids().collect())
            .unwrap_or_default())
    }

    /// Appends an item, creating the collection on first use.
    ///
    /// Items are unique by title within a collection; the same external ID
    /// under a different title is accepted.
    pub async fn add(&self, user_id: Uuid, item: SavedItem) -> AppResult<()> {
        self.mutate(user_id, true, |collection| {
            if collection.contains_title(&item.title) {
                return Err(AppError::Conflict(format!(
                    "'{}' is already in your collection",
                    item.title
                )));
            }
            collection.items.push(item.clone());
            Ok(())
        })
        .await?;

        tracing::info!(user_id = %user_id, item_id = item.id, "Item added to collection");
        Ok(())
    }

    /// Sets the watch status of one saved item.
    ///
    /// Fails with `NotFound` when the user has no collection or the item is
    /// not in it; a missing collection is never created here.
    pub async fn update_status(
        &self,
        user_id: Uuid,
        item_id: u64,
        status: WatchStatus,
    ) -> AppResult<()> {
        self.mutate(user_id, false, |collection| {
            let index = collection
                .position_of(item_id)
                .ok_or_else(item_not_found)?;
            collection.items[index].status = status;
            Ok(())
        })
        .await?;

        tracing::info!(user_id = %user_id, item_id, status = %status, "Item status updated");
        Ok(())
    }

    /// Removes one saved item, keeping the order of the rest
    pub async fn remove(&self, user_id: Uuid, item_id: u64) -> AppResult<()> {
        self.mutate(user_id, false, |collection| {
            let index = collection
                .position_of(item_id)
                .ok_or_else(item_not_found)?;
            collection.items.remove(index);
            Ok(())
        })
        .await?;

        tracing::info!(user_id = %user_id, item_id, "Item removed from collection");
        Ok(())
    }

    /// Read-modify-write with version compare-and-swap.
    ///
    /// `apply` may run more than once, always against the latest stored
    /// document. An error from `apply` aborts without writing.
    async fn mutate<F>(&self, user_id: Uuid, create_if_missing: bool, apply: F) -> AppResult<()>
    where
        F: Fn(&mut Collection) -> AppResult<()>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut collection = match self.store.load(user_id).await? {
                Some(collection) => collection,
                None if create_if_missing => Collection::new(user_id),
                None => return Err(AppError::NotFound("Collection not found".to_string())),
            };

            apply(&mut collection)?;

            match self.store.save(&collection).await? {
                SaveOutcome::Saved(_) => return Ok(()),
                SaveOutcome::Stale => {
                    tracing::debug!(user_id = %user_id, attempt, "Stale collection write, retrying");
                }
            }
        }

        Err(stale_write_error(user_id))
    }
}

fn item_not_found() -> AppError {
    AppError::NotFound("Movie not found in collection".to_string())
}
