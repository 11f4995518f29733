pub mod collections;
pub mod postgres;
pub mod redis;
pub mod users;

pub use collections::{CollectionStore, InMemoryCollectionStore, PgCollectionStore, SaveOutcome};
pub use postgres::create_pool;
pub use self::redis::create_redis_client;
pub use self::redis::Cache;
pub use self::redis::CacheKey;
pub use self::redis::CacheWriterHandle;
pub use users::{InMemoryUserStore, PgUserStore, UserStore};
