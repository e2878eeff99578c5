use std::fmt::Display;

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Scored items generated for one of a user's collections
    Recommendations { user_id: Uuid, collection_id: i32 },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Recommendations {
                user_id,
                collection_id,
            } => write!(f, "recommendations:{}:{}", user_id, collection_id),
        }
    }
}

/// Key-value store holding JSON payloads
///
/// Implementations report failures; callers go through [`read_json`],
/// [`write_json`] and [`evict`], which degrade every failure to a miss or a no-op.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<String>>;

    /// Stores the payload with no expiration
    async fn set(&self, key: &CacheKey, value: String) -> AppResult<()>;

    async fn delete(&self, key: &CacheKey) -> AppResult<()>;

    /// Deletes every key in one round trip. An empty slice is a no-op.
    async fn delete_many(&self, keys: &[CacheKey]) -> AppResult<()>;
}

/// Reads and decodes a cached value, treating any failure as a miss
pub async fn read_json<T: DeserializeOwned>(cache: &dyn CacheStore, key: &CacheKey) -> Option<T> {
    let raw = match cache.get(key).await {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(cache_key = %key, error = %e, "Cache read failed");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(cache_key = %key, error = %e, "Cached payload could not be decoded");
            None
        }
    }
}

/// Encodes and stores a value, logging instead of failing
pub async fn write_json<T: Serialize + ?Sized>(cache: &dyn CacheStore, key: &CacheKey, value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(cache_key = %key, error = %e, "Cache serialization error");
            return;
        }
    };

    if let Err(e) = cache.set(key, json).await {
        tracing::warn!(cache_key = %key, error = %e, "Cache write failed");
    }
}

/// Deletes keys, logging instead of failing
pub async fn evict(cache: &dyn CacheStore, keys: &[CacheKey]) {
    let result = match keys {
        [] => return,
        [key] => cache.delete(key).await,
        _ => cache.delete_many(keys).await,
    };

    if let Err(e) = result {
        tracing::warn!(key_count = keys.len(), error = %e, "Cache invalidation failed");
    }
}
