use std::sync::Arc;

use crate::{
    config::Config,
    db::{
        create_pool, create_redis_client, Cache, CacheWriterHandle, CollectionStore,
        InMemoryCollectionStore, InMemoryUserStore, PgCollectionStore, PgUserStore, UserStore,
    },
    services::{
        catalog::{CachedCatalog, TmdbCatalog},
        recommendations::FanOutPolicy,
        AccountService, AuthGateway, CatalogClient, CollectionManager, RecommendationAggregator,
    },
};

/// Shared application state
pub struct AppState {
    pub catalog: Arc<dyn CatalogClient>,
    pub collections: CollectionManager,
    pub recommendations: RecommendationAggregator,
    pub accounts: AccountService,
    pub auth: AuthGateway,
}

/// Components the state is assembled from
pub struct StateParts {
    pub catalog: Arc<dyn CatalogClient>,
    pub collection_store: Arc<dyn CollectionStore>,
    pub user_store: Arc<dyn UserStore>,
    pub auth: AuthGateway,
    pub fan_out: FanOutPolicy,
    pub recommendation_timeout: std::time::Duration,
}

impl AppState {
    pub fn new(parts: StateParts) -> Self {
        let collections = CollectionManager::new(parts.collection_store);
        let recommendations = RecommendationAggregator::new(
            parts.catalog.clone(),
            collections.clone(),
            parts.fan_out,
            parts.recommendation_timeout,
        );
        let accounts = AccountService::new(parts.user_store, parts.auth.clone());

        Self {
            catalog: parts.catalog,
            collections,
            recommendations,
            accounts,
            auth: parts.auth,
        }
    }

    /// Wires stores, cache and catalog client from configuration.
    ///
    /// Returns the cache writer handle when caching is enabled so the caller
    /// can flush it on shutdown.
    pub async fn from_config(
        config: &Config,
    ) -> anyhow::Result<(Self, Option<CacheWriterHandle>)> {
        let tmdb = TmdbCatalog::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.catalog_timeout(),
        )?;
        let mut catalog: Arc<dyn CatalogClient> = Arc::new(tmdb);

        let mut cache_handle = None;
        if let Some(redis_url) = &config.redis_url {
            let (cache, handle) = Cache::new(create_redis_client(redis_url)?);
            catalog = Arc::new(CachedCatalog::new(catalog, cache));
            cache_handle = Some(handle);
            tracing::info!("Catalog cache enabled");
        }

        let (collection_store, user_store): (Arc<dyn CollectionStore>, Arc<dyn UserStore>) =
            match &config.database_url {
                Some(url) => {
                    let pool = create_pool(url).await?;
                    (
                        Arc::new(PgCollectionStore::new(pool.clone())),
                        Arc::new(PgUserStore::new(pool)),
                    )
                }
                None => {
                    tracing::warn!("DATABASE_URL not set, using in-memory stores");
                    (
                        Arc::new(InMemoryCollectionStore::new()),
                        Arc::new(InMemoryUserStore::new()),
                    )
                }
            };

        let state = Self::new(StateParts {
            catalog,
            collection_store,
            user_store,
            auth: AuthGateway::new(&config.jwt_secret, config.jwt_ttl_secs),
            fan_out: config.recommendation_fan_out,
            recommendation_timeout: config.recommendation_timeout(),
        });

        Ok((state, cache_handle))
    }
}
