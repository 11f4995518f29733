use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogItem, DiscoverFilters, GenreTag},
    services::{catalog::CatalogClient, collection::CollectionManager},
};

/// Upper bound on the size of a recommendation list
pub const MAX_RECOMMENDED: usize = 20;
/// The aggregation stops widening once this many sources are queried
pub const MAX_SOURCES: usize = 20;
/// Items taken from each source while sources keep yielding new candidates
pub const DEFAULT_FETCH_PER_SOURCE: usize = 10;
/// Items taken from each source after an iteration that yielded nothing new
pub const FALLBACK_FETCH_PER_SOURCE: usize = 5;

/// Handling of a failed discovery call during fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOutPolicy {
    /// Any failed call fails the whole aggregation
    #[default]
    AllOrNothing,
    /// Failed calls are skipped and the result is flagged as degraded
    TolerateFailures,
}

/// One discovery source in the aggregation's working list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationSource {
    /// Popularity discovery restricted to one catalog genre
    Genre(u64),
    /// Unfiltered popularity discovery, added when genres run dry
    PopularityFallback,
}

impl RecommendationSource {
    fn filters(&self) -> DiscoverFilters {
        match self {
            RecommendationSource::Genre(id) => DiscoverFilters::popular_in(Some(*id)),
            RecommendationSource::PopularityFallback => DiscoverFilters::popular_in(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub items: Vec<CatalogItem>,
    /// Set when some discovery calls failed and were skipped
    pub degraded: bool,
}

/// Builds genre-personalised recommendations excluding already-saved items.
///
/// Each iteration queries every source concurrently, drops candidates the
/// user already saved or that were already accumulated, and appends the
/// rest. An iteration that adds nothing widens the pool with a popularity
/// fallback source and shrinks the per-source fetch. The loop ends once
/// `MAX_RECOMMENDED` items are accumulated or `MAX_SOURCES` sources are in
/// play.
pub struct RecommendationAggregator {
    catalog: Arc<dyn CatalogClient>,
    collections: CollectionManager,
    policy: FanOutPolicy,
    deadline: Duration,
}

impl RecommendationAggregator {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        collections: CollectionManager,
        policy: FanOutPolicy,
        deadline: Duration,
    ) -> Self {
        Self {
            catalog,
            collections,
            policy,
            deadline,
        }
    }

    pub async fn recommend(&self, user_id: Uuid, genres: &[GenreTag]) -> AppResult<Recommendations> {
        tokio::time::timeout(self.deadline, self.aggregate(user_id, genres))
            .await
            .map_err(|_| {
                tracing::warn!(user_id = %user_id, deadline = ?self.deadline, "Recommendation deadline exceeded");
                AppError::UpstreamTimeout("Recommendation request timed out".to_string())
            })?
    }

    async fn aggregate(&self, user_id: Uuid, genres: &[GenreTag]) -> AppResult<Recommendations> {
        let mut sources: Vec<RecommendationSource> = genres
            .iter()
            .filter(|g| !g.is_empty())
            .map(|g| RecommendationSource::Genre(g.id))
            .collect();

        if sources.is_empty() {
            return Err(no_recommendations());
        }

        let mut per_source_fetch = DEFAULT_FETCH_PER_SOURCE;
        let mut accumulated: Vec<CatalogItem> = Vec::new();
        let mut seen: HashSet<u64> = HashSet::new();
        let mut degraded = false;
        let mut iterations = 0usize;

        while accumulated.len() < MAX_RECOMMENDED && sources.len() < MAX_SOURCES {
            iterations += 1;

            let batches = self.fetch_sources(&sources, per_source_fetch).await?;
            degraded |= batches.len() < sources.len();

            // Re-read every iteration so items saved meanwhile are excluded
            let saved = self.collections.saved_ids(user_id).await?;

            let mut fresh = 0usize;
            for item in batches.into_iter().flatten() {
                if saved.contains(&item.id) || !seen.insert(item.id) {
                    continue;
                }
                accumulated.push(item);
                fresh += 1;
            }
            accumulated.truncate(MAX_RECOMMENDED);

            if fresh == 0 {
                sources.push(RecommendationSource::PopularityFallback);
                per_source_fetch = FALLBACK_FETCH_PER_SOURCE;
            } else {
                per_source_fetch = DEFAULT_FETCH_PER_SOURCE;
            }

            tracing::debug!(
                user_id = %user_id,
                iteration = iterations,
                fresh,
                accumulated = accumulated.len(),
                sources = sources.len(),
                "Recommendation iteration finished"
            );
        }

        tracing::info!(
            user_id = %user_id,
            iterations,
            count = accumulated.len(),
            degraded,
            "Recommendations aggregated"
        );

        if accumulated.is_empty() {
            return Err(no_recommendations());
        }

        Ok(Recommendations {
            items: accumulated,
            degraded,
        })
    }

    /// Queries all sources concurrently, keeping the top `limit` of each.
    ///
    /// Returns one batch per successful source, in source order.
    async fn fetch_sources(
        &self,
        sources: &[RecommendationSource],
        limit: usize,
    ) -> AppResult<Vec<Vec<CatalogItem>>> {
        let calls = sources.iter().map(|source| {
            let filters = source.filters();
            async move { self.catalog.discover(&filters).await }
        });

        let results = join_all(calls).await;

        let mut batches = Vec::with_capacity(results.len());
        let mut first_error = None;

        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(mut items) => {
                    items.truncate(limit);
                    batches.push(items);
                }
                Err(e) => {
                    tracing::error!(
                        provider = self.catalog.name(),
                        source = ?source,
                        error = %e,
                        "Discovery call failed"
                    );
                    if self.policy == FanOutPolicy::AllOrNothing {
                        return Err(e);
                    }
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if batches.is_empty() => Err(e),
            Some(_) => {
                tracing::warn!(
                    provider = self.catalog.name(),
                    success_count = batches.len(),
                    error_count = sources.len() - batches.len(),
                    "Partial discovery failure"
                );
                Ok(batches)
            }
            None => Ok(batches),
        }
    }
}

fn no_recommendations() -> AppError {
    AppError::EmptyResult("No recommendations found".to_string())
}
