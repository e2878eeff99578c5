use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{
    db::MangaRepository,
    error::AppResult,
    models::{CandidateQuery, Manga, Membership},
};

use super::profile::MetadataProfile;

/// Selects unscored candidates sharing at least one genre, tag or demographic with the profile
///
/// Returns an empty list without querying when the profile has no such attributes.
pub async fn select_candidates(
    repo: &dyn MangaRepository,
    seed_ids: &[i32],
    profile: &MetadataProfile,
    max_candidates: i64,
) -> AppResult<Vec<Manga>> {
    let query = CandidateQuery {
        excluded_ids: seed_ids.to_vec(),
        genre_ids: profile.genres.ids(),
        tag_ids: profile.tags.ids(),
        demographic_ids: profile.demographics.ids(),
        limit: max_candidates,
    };

    if query.has_no_attributes() {
        tracing::info!("Seed set has no classifiable metadata, skipping candidate selection");
        return Ok(Vec::new());
    }

    let fetched = repo.fetch_candidates(&query).await?;

    // Hold the selection rule regardless of what the store returned.
    let excluded: HashSet<i32> = seed_ids.iter().copied().collect();
    let mut seen = HashSet::new();
    let candidates: Vec<Manga> = fetched
        .into_iter()
        .filter(|m| {
            m.external_average_rating.is_some()
                && !excluded.contains(&m.manga_id)
                && seen.insert(m.manga_id)
        })
        .collect();

    tracing::info!(
        candidate_count = candidates.len(),
        "Generated candidate manga to score"
    );

    Ok(candidates)
}

/// Attribute ids attached to each manga
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeIndex(HashMap<i32, BTreeSet<i32>>);

impl AttributeIndex {
    pub fn of(&self, manga_id: i32) -> impl Iterator<Item = &i32> {
        self.0.get(&manga_id).into_iter().flatten()
    }

    pub fn shares_any(&self, manga_id: i32, ids: &HashSet<i32>) -> bool {
        self.of(manga_id).any(|id| ids.contains(id))
    }
}

impl FromIterator<(i32, i32)> for AttributeIndex {
    fn from_iter<I: IntoIterator<Item = (i32, i32)>>(iter: I) -> Self {
        let mut index: HashMap<i32, BTreeSet<i32>> = HashMap::new();
        for (manga_id, attribute_id) in iter {
            index.entry(manga_id).or_default().insert(attribute_id);
        }
        AttributeIndex(index)
    }
}

/// Genre, tag, demographic and author sets of the candidates being scored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFeatures {
    pub genres: AttributeIndex,
    pub tags: AttributeIndex,
    pub demographics: AttributeIndex,
    pub authors: AttributeIndex,
}

/// Loads the attribute sets of every candidate in four bulk lookups
pub async fn load_candidate_features(
    repo: &dyn MangaRepository,
    candidate_ids: &[i32],
) -> AppResult<CandidateFeatures> {
    if candidate_ids.is_empty() {
        return Ok(CandidateFeatures::default());
    }

    let (genres, tags, demographics, authors) = tokio::try_join!(
        repo.fetch_membership(Membership::Genre, candidate_ids),
        repo.fetch_membership(Membership::Tag, candidate_ids),
        repo.fetch_membership(Membership::Demographic, candidate_ids),
        repo.fetch_membership(Membership::Author, candidate_ids),
    )?;

    Ok(CandidateFeatures {
        genres: genres.into_iter().collect(),
        tags: tags.into_iter().collect(),
        demographics: demographics.into_iter().collect(),
        authors: authors.into_iter().collect(),
    })
}
