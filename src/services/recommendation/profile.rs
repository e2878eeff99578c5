use std::collections::{BTreeMap, HashSet};

use chrono::Datelike;

use crate::{db::MangaRepository, error::AppResult, models::Membership};

/// Occurrence count per attribute id
///
/// Absent ids count as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyMap(BTreeMap<i32, u32>);

impl FrequencyMap {
    pub fn record(&mut self, id: i32) {
        *self.0.entry(id).or_insert(0) += 1;
    }

    pub fn count(&self, id: i32) -> u32 {
        self.0.get(&id).copied().unwrap_or(0)
    }

    /// Attribute ids in ascending order
    pub fn ids(&self) -> Vec<i32> {
        self.0.keys().copied().collect()
    }

    /// Sum of the counts of every id in `ids`
    pub fn weight_of<'a>(&self, ids: impl IntoIterator<Item = &'a i32>) -> u32 {
        ids.into_iter().map(|id| self.count(*id)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<i32> for FrequencyMap {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        let mut map = FrequencyMap::default();
        for id in iter {
            map.record(id);
        }
        map
    }
}

/// Aggregate metadata of a seed set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataProfile {
    pub genres: FrequencyMap,
    pub tags: FrequencyMap,
    pub demographics: FrequencyMap,
    pub authors: HashSet<i32>,
    /// Non-null external ratings of the seeds
    pub external_ratings: Vec<f64>,
    /// Publication years of the seeds with a known date
    pub years: Vec<i32>,
}

impl MetadataProfile {
    pub fn average_rating(&self) -> Option<f64> {
        if self.external_ratings.is_empty() {
            return None;
        }
        Some(self.external_ratings.iter().sum::<f64>() / self.external_ratings.len() as f64)
    }

    /// Mean publication year, rounded half to even
    pub fn average_year(&self) -> Option<i32> {
        if self.years.is_empty() {
            return None;
        }
        let sum: i64 = self.years.iter().map(|y| i64::from(*y)).sum();
        let mean = sum as f64 / self.years.len() as f64;
        Some(mean.round_ties_even() as i32)
    }

    /// True when the seeds carry at least one genre, tag or demographic
    pub fn has_classifiable_metadata(&self) -> bool {
        !(self.genres.is_empty() && self.tags.is_empty() && self.demographics.is_empty())
    }
}

/// Builds the metadata profile of `seed_ids`
///
/// All lookups run concurrently; the first failure aborts the build.
pub async fn build_profile(
    repo: &dyn MangaRepository,
    seed_ids: &[i32],
) -> AppResult<MetadataProfile> {
    let (genres, tags, demographics, authors, ratings, dates) = tokio::try_join!(
        repo.fetch_membership(Membership::Genre, seed_ids),
        repo.fetch_membership(Membership::Tag, seed_ids),
        repo.fetch_membership(Membership::Demographic, seed_ids),
        repo.fetch_membership(Membership::Author, seed_ids),
        repo.fetch_external_ratings(seed_ids),
        repo.fetch_published_dates(seed_ids),
    )?;

    let profile = MetadataProfile {
        genres: genres.into_iter().map(|(_, id)| id).collect(),
        tags: tags.into_iter().map(|(_, id)| id).collect(),
        demographics: demographics.into_iter().map(|(_, id)| id).collect(),
        authors: authors.into_iter().map(|(_, id)| id).collect(),
        external_ratings: ratings.into_iter().filter_map(|(_, r)| r).collect(),
        years: dates
            .into_iter()
            .filter_map(|(_, date)| date.map(|d| d.year()))
            .collect(),
    };

    tracing::debug!(
        seed_count = seed_ids.len(),
        genre_count = profile.genres.ids().len(),
        tag_count = profile.tags.ids().len(),
        demographic_count = profile.demographics.ids().len(),
        author_count = profile.authors.len(),
        "Built metadata profile"
    );

    Ok(profile)
}
