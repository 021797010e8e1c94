//! Cache implementations - Redis and in-memory fallback - plus the
//! read-through helper the list endpoints are wrapped with.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use folio_core::ports::Cache;

mod memory;

pub use memory::InMemoryCache;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisCache, RedisConfig};

/// TTL applied to cached listings.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Listing TTL, overridable via CACHE_TTL_SECS.
pub fn cache_ttl_from_env() -> Duration {
    parse_ttl(std::env::var("CACHE_TTL_SECS").ok())
}

fn parse_ttl(raw: Option<String>) -> Duration {
    raw.and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_CACHE_TTL)
}

/// Serve `key` from the cache, or compute, store, and return.
///
/// On a hit the stored payload is deserialized and `compute` never runs. On
/// a miss the computed value is stored under `key` with the given TTL. Cache
/// store failures are logged and the computed value is still served - the
/// cache is an optimization, never a correctness dependency. Two concurrent
/// misses may both compute and both write; last write wins.
pub async fn read_through<T, E, F, Fut>(
    cache: &dyn Cache,
    key: &str,
    ttl: Duration,
    compute: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(raw) = cache.get(key).await {
        match serde_json::from_str(&raw) {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "dropping undeserializable cache entry");
                let _ = cache.delete(key).await;
            }
        }
    }

    let value = compute().await?;

    match serde_json::to_string(&value) {
        Ok(raw) => {
            if let Err(e) = cache.set(key, &raw, Some(ttl)).await {
                tracing::warn!(key, error = %e, "cache store failed; serving computed value");
            }
        }
        Err(e) => tracing::warn!(key, error = %e, "cache serialization failed"),
    }

    Ok(value)
}
