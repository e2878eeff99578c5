use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{
        cache::{evict, read_json, write_json},
        CacheKey, CacheStore, MangaRepository,
    },
    error::{AppError, AppResult},
    models::{RecommendationOutcome, ScoredRecommendation},
};

use super::recommendation::{RecommendationGenerator, RecommendationLimits};

/// Serves recommendations with a read-through cache for the collection path
///
/// Cache failures never fail a request; they degrade to recomputing.
pub struct RecommendationService {
    generator: RecommendationGenerator,
    repo: Arc<dyn MangaRepository>,
    cache: Arc<dyn CacheStore>,
}

impl RecommendationService {
    pub fn new(
        repo: Arc<dyn MangaRepository>,
        cache: Arc<dyn CacheStore>,
        limits: RecommendationLimits,
    ) -> Self {
        Self {
            generator: RecommendationGenerator::new(repo.clone(), limits),
            repo,
            cache,
        }
    }

    /// Recommendations for one of the user's collections
    ///
    /// Ownership is checked before the cache so a foreign collection is always
    /// `NotFound`. Only the items are cached, so a cache hit carries no seed summary.
    pub async fn for_collection(
        &self,
        user_id: Uuid,
        collection_id: i32,
    ) -> AppResult<RecommendationOutcome> {
        if !self.repo.collection_owned_by(user_id, collection_id).await? {
            return Err(AppError::NotFound("Collection not found.".to_string()));
        }

        let key = CacheKey::Recommendations {
            user_id,
            collection_id,
        };

        if let Some(items) = read_json::<Vec<ScoredRecommendation>>(self.cache.as_ref(), &key).await {
            tracing::debug!(cache_key = %key, "Cache hit");
            return Ok(RecommendationOutcome { items, seeds: None });
        }

        tracing::debug!(cache_key = %key, "Cache miss");
        let result = self.generator.for_collection(user_id, collection_id).await?;
        write_json(self.cache.as_ref(), &key, &result.items).await;

        Ok(result.into())
    }

    /// Recommendations for an ad-hoc list of manga ids, never cached
    pub async fn for_list(&self, manga_ids: &[i32]) -> AppResult<RecommendationOutcome> {
        let result = self.generator.for_list(manga_ids).await?;
        Ok(result.into())
    }

    /// Drops the cached sets of every collection the user owns
    ///
    /// Called whenever one of the user's ratings changes.
    pub async fn invalidate_user(&self, user_id: Uuid) -> AppResult<()> {
        let keys: Vec<CacheKey> = self
            .repo
            .fetch_user_collection_ids(user_id)
            .await?
            .into_iter()
            .map(|collection_id| CacheKey::Recommendations {
                user_id,
                collection_id,
            })
            .collect();

        tracing::info!(user_id = %user_id, key_count = keys.len(), "Invalidating user recommendations");
        evict(self.cache.as_ref(), &keys).await;
        Ok(())
    }

    /// Drops the cached set of a single collection
    ///
    /// Called when the collection's membership, name or existence changes.
    pub async fn invalidate_collection(&self, user_id: Uuid, collection_id: i32) {
        let key = CacheKey::Recommendations {
            user_id,
            collection_id,
        };

        tracing::info!(cache_key = %key, "Invalidating collection recommendations");
        evict(self.cache.as_ref(), &[key]).await;
    }
}
