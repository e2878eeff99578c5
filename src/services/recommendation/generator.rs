use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::{db::MangaRepository, error::AppResult, models::RecommendationResult};

use super::{
    candidates::{load_candidate_features, select_candidates},
    profile::build_profile,
    scoring::score_candidates,
    seeds::{resolve_from_collection, resolve_from_list, SeedSet},
    RecommendationLimits,
};

/// Runs the recommendation pipeline for a collection or an ad-hoc list
///
/// Errors from any step propagate unchanged.
#[derive(Clone)]
pub struct RecommendationGenerator {
    repo: Arc<dyn MangaRepository>,
    limits: RecommendationLimits,
}

impl RecommendationGenerator {
    pub fn new(repo: Arc<dyn MangaRepository>, limits: RecommendationLimits) -> Self {
        Self { repo, limits }
    }

    /// Recommendations seeded by the manga of a collection owned by `user_id`
    pub async fn for_collection(
        &self,
        user_id: Uuid,
        collection_id: i32,
    ) -> AppResult<RecommendationResult> {
        let seeds = resolve_from_collection(
            self.repo.as_ref(),
            user_id,
            collection_id,
            self.limits.max_seeds,
        )
        .await?;

        tracing::info!(
            user_id = %user_id,
            collection_id,
            seed_count = seeds.ids().len(),
            "Generating recommendations for collection"
        );

        self.run(seeds).await
    }

    /// Recommendations seeded by a caller-supplied id list
    pub async fn for_list(&self, manga_ids: &[i32]) -> AppResult<RecommendationResult> {
        let seeds = resolve_from_list(manga_ids, self.limits.max_seeds)?;

        tracing::info!(
            seed_count = seeds.ids().len(),
            "Generating recommendations for manga list"
        );

        self.run(seeds).await
    }

    async fn run(&self, seeds: SeedSet) -> AppResult<RecommendationResult> {
        let start = Instant::now();
        let summary = seeds.summary();

        if summary.seed_truncated {
            tracing::info!(
                seed_total = summary.seed_total,
                seed_used = summary.seed_used,
                "Seed set truncated"
            );
        }

        let repo = self.repo.as_ref();
        let profile = build_profile(repo, seeds.ids()).await?;
        let candidates =
            select_candidates(repo, seeds.ids(), &profile, self.limits.max_candidates).await?;

        let items = if candidates.is_empty() {
            Vec::new()
        } else {
            let candidate_ids: Vec<i32> = candidates.iter().map(|m| m.manga_id).collect();
            let features = load_candidate_features(repo, &candidate_ids).await?;
            score_candidates(candidates, &features, &profile)
        };

        tracing::info!(
            item_count = items.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendations generated"
        );

        Ok(RecommendationResult {
            items,
            seeds: summary,
        })
    }
}
