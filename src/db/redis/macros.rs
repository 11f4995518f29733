/// Read-through caching around an async computation.
///
/// On a hit the cached value is returned. On a miss `$block` is awaited,
/// its value handed to the background writer with `$ttl` seconds to live,
/// and returned. Errors from `$block` are propagated and never cached.
///
/// A failed cache read (Redis unreachable, unreadable entry) is logged and
/// treated as a miss, so the computation still runs.
///
/// Expands to an expression of type `Result<_, AppError>`, so it must be
/// used inside an `async` fn returning `AppResult`.
///
/// ```rust,ignore
/// let item: CatalogItem = cached!(self.cache, CacheKey::CatalogItem(id), ITEM_TTL, async move {
///     self.inner.get_by_id(id).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, bypassing cache");
                None
            }
        };
        if let Some(cached) = hit {
            tracing::debug!(key = %key, "Cache hit");
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
