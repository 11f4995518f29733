pub mod catalog;
pub mod collection;
pub mod user;

pub use catalog::{CatalogGenre, CatalogItem, CatalogItemDetails, CatalogPage, DiscoverFilters};
pub use collection::{Collection, SavedItem, WatchStatus};
pub use user::{AuthUser, Claims, ContentPreference, GenreTag, Role, User, UserProfile};
