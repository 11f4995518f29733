use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::GenreTag;

/// Viewing status a user assigns to a saved item
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WatchStatus {
    #[default]
    ToWatch,
    Watching,
    Watched,
}

impl std::fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WatchStatus::ToWatch => "to-watch",
            WatchStatus::Watching => "watching",
            WatchStatus::Watched => "watched",
        };
        f.write_str(s)
    }
}

/// A catalog item reference stored in a user's collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    /// External catalog ID
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<GenreTag>,
    #[serde(default)]
    pub status: WatchStatus,
    pub added_at: DateTime<Utc>,
}

impl SavedItem {
    pub fn new(id: u64, title: String, poster_path: Option<String>, genres: Vec<GenreTag>) -> Self {
        Self {
            id,
            title,
            poster_path,
            genres,
            status: WatchStatus::default(),
            added_at: Utc::now(),
        }
    }
}

/// The per-user ordered list of saved items.
///
/// `version` is the optimistic-concurrency token checked by the store on
/// every write; a collection that has never been persisted has version 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collection {
    pub user_id: Uuid,
    pub items: Vec<SavedItem>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Titles are the uniqueness key inside a collection, not external IDs
    pub fn contains_title(&self, title: &str) -> bool {
        self.items.iter().any(|item| item.title == title)
    }

    pub fn position_of(&self, item_id: u64) -> Option<usize> {
        self.items.iter().position(|item| item.id == item_id)
    }

    pub fn saved_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.items.iter().map(|item| item.id)
    }
}
