use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    db::MangaRepository,
    error::{AppError, AppResult},
    models::SeedSummary,
};

/// Deduplicated, capped list of manga anchoring a recommendation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSet {
    ids: Vec<i32>,
    total: usize,
}

impl SeedSet {
    /// Deduplicates preserving first occurrence, then keeps at most `max_seeds` ids
    fn capped(ids: impl IntoIterator<Item = i32>, max_seeds: usize) -> Self {
        let mut seen = HashSet::new();
        let mut ids: Vec<i32> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        let total = ids.len();
        ids.truncate(max_seeds);

        Self { ids, total }
    }

    pub fn ids(&self) -> &[i32] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn summary(&self) -> SeedSummary {
        SeedSummary {
            seed_total: self.total,
            seed_used: self.ids.len(),
            seed_truncated: self.total > self.ids.len(),
        }
    }
}

/// Resolves seeds from a caller-supplied id list
///
/// Non-positive ids are discarded as invalid. Fails with `BadRequest` when
/// nothing usable remains.
pub fn resolve_from_list(manga_ids: &[i32], max_seeds: usize) -> AppResult<SeedSet> {
    let seeds = SeedSet::capped(manga_ids.iter().copied().filter(|id| *id > 0), max_seeds);

    if seeds.is_empty() {
        return Err(AppError::BadRequest(
            "Need at least 1 manga in the list to generate recommendations.".to_string(),
        ));
    }

    Ok(seeds)
}

/// Resolves seeds from a collection owned by `user_id`
///
/// Fails with `NotFound` for a missing or foreign collection and with
/// `BadRequest` for an empty one.
pub async fn resolve_from_collection(
    repo: &dyn MangaRepository,
    user_id: Uuid,
    collection_id: i32,
    max_seeds: usize,
) -> AppResult<SeedSet> {
    let manga_ids = repo
        .fetch_collection_manga_ids(user_id, collection_id)
        .await?;
    let seeds = SeedSet::capped(manga_ids, max_seeds);

    if seeds.is_empty() {
        return Err(AppError::BadRequest(
            "Need at least 1 manga in the collection to generate recommendations.".to_string(),
        ));
    }

    Ok(seeds)
}
