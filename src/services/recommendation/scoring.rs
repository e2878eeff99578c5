use chrono::Datelike;

use crate::models::{Manga, ScoreDetails, ScoredRecommendation};

use super::{candidates::CandidateFeatures, profile::MetadataProfile};

const GENRE_WEIGHT: f64 = 2.0;
const TAG_WEIGHT: f64 = 3.0;
const DEMOGRAPHIC_WEIGHT: f64 = 1.25;
const AUTHOR_BONUS: f64 = 3.0;
/// Maximum of the rating and year proximity terms
const PROXIMITY_CEILING: f64 = 5.0;
/// Points lost per year away from the seed average
const YEAR_FALLOFF: f64 = 0.5;

/// Scores every candidate against the profile and ranks them
///
/// Higher scores come first; equal scores are ordered by ascending manga id.
/// Candidates with no overlap at all are kept with a score of zero.
pub fn score_candidates(
    candidates: Vec<Manga>,
    features: &CandidateFeatures,
    profile: &MetadataProfile,
) -> Vec<ScoredRecommendation> {
    // Computed once per request, not per candidate.
    let avg_rating = profile.average_rating();
    let avg_year = profile.average_year();

    let mut scored: Vec<ScoredRecommendation> = candidates
        .into_iter()
        .map(|manga| {
            let details = score_details(&manga, features, profile, avg_rating, avg_year);
            ScoredRecommendation {
                manga_id: manga.manga_id,
                title: manga.title,
                external_average_rating: manga.external_average_rating,
                cover_image_url: manga.cover_image_url,
                score: round_to_cents(details.total()),
                details,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.manga_id.cmp(&b.manga_id))
    });

    scored
}

fn score_details(
    manga: &Manga,
    features: &CandidateFeatures,
    profile: &MetadataProfile,
    avg_rating: Option<f64>,
    avg_year: Option<i32>,
) -> ScoreDetails {
    let id = manga.manga_id;

    let genre_score = f64::from(profile.genres.weight_of(features.genres.of(id))) * GENRE_WEIGHT;
    let tag_score = f64::from(profile.tags.weight_of(features.tags.of(id))) * TAG_WEIGHT;
    let demo_score =
        f64::from(profile.demographics.weight_of(features.demographics.of(id))) * DEMOGRAPHIC_WEIGHT;

    let author_score = if features.authors.shares_any(id, &profile.authors) {
        AUTHOR_BONUS
    } else {
        0.0
    };

    let rating_score = match (manga.external_average_rating, avg_rating) {
        (Some(rating), Some(avg)) => (PROXIMITY_CEILING - (rating - avg).abs()).max(0.0),
        _ => 0.0,
    };

    let year_score = match (manga.published_date, avg_year) {
        (Some(date), Some(avg)) => {
            let distance = f64::from((date.year() - avg).abs());
            (PROXIMITY_CEILING - distance * YEAR_FALLOFF).max(0.0)
        }
        _ => 0.0,
    };

    ScoreDetails {
        genre_score,
        tag_score,
        demo_score,
        author_score,
        rating_score,
        year_score,
    }
}

/// Half-cent scores round to the even cent
fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    const ACTION: i32 = 1;
    const ROMANCE: i32 = 2;
    const SHOUNEN: i32 = 10;
    const ISEKAI_TAG: i32 = 20;

    fn manga(manga_id: i32, rating: Option<f64>, year: Option<i32>) -> Manga {
        Manga {
            manga_id,
            title: format!("Manga {}", manga_id),
            external_average_rating: rating,
            published_date: year.and_then(|y| NaiveDate::from_ymd_opt(y, 6, 1)),
            cover_image_url: None,
        }
    }

    fn seed_profile() -> MetadataProfile {
        MetadataProfile {
            genres: vec![ACTION].into_iter().collect(),
            tags: Default::default(),
            demographics: vec![SHOUNEN].into_iter().collect(),
            authors: HashSet::from([100]),
            external_ratings: vec![8.0],
            years: vec![2015],
        }
    }

    fn features(pairs: &[(&str, i32, i32)]) -> CandidateFeatures {
        let pick = |kind: &str| {
            pairs
                .iter()
                .filter(|(k, _, _)| *k == kind)
                .map(|(_, m, a)| (*m, *a))
                .collect()
        };
        CandidateFeatures {
            genres: pick("genre"),
            tags: pick("tag"),
            demographics: pick("demo"),
            authors: pick("author"),
        }
    }

    #[test]
    fn test_end_to_end_scenario_without_author() {
        let features = features(&[("genre", 3, ACTION), ("demo", 3, SHOUNEN)]);
        let scored = score_candidates(
            vec![manga(3, Some(8.0), Some(2015))],
            &features,
            &seed_profile(),
        );

        let item = &scored[0];
        assert_eq!(item.details.genre_score, 2.0);
        assert_eq!(item.details.tag_score, 0.0);
        assert_eq!(item.details.demo_score, 1.25);
        assert_eq!(item.details.author_score, 0.0);
        assert_eq!(item.details.rating_score, 5.0);
        assert_eq!(item.details.year_score, 5.0);
        assert_eq!(item.score, 13.25);
    }

    #[test]
    fn test_end_to_end_scenario_with_shared_author() {
        let features = features(&[
            ("genre", 3, ACTION),
            ("demo", 3, SHOUNEN),
            ("author", 3, 100),
        ]);
        let scored = score_candidates(
            vec![manga(3, Some(8.0), Some(2015))],
            &features,
            &seed_profile(),
        );

        assert_eq!(scored[0].details.author_score, 3.0);
        assert_eq!(scored[0].score, 16.25);
    }

    #[test]
    fn test_attribute_terms_use_seed_frequency() {
        let profile = MetadataProfile {
            genres: vec![ACTION, ACTION, ACTION, ROMANCE].into_iter().collect(),
            tags: vec![ISEKAI_TAG, ISEKAI_TAG].into_iter().collect(),
            ..Default::default()
        };
        let features = features(&[
            ("genre", 3, ACTION),
            ("genre", 3, ROMANCE),
            ("tag", 3, ISEKAI_TAG),
        ]);

        let scored = score_candidates(vec![manga(3, Some(6.0), None)], &features, &profile);
        assert_eq!(scored[0].details.genre_score, 8.0);
        assert_eq!(scored[0].details.tag_score, 6.0);
    }

    #[test]
    fn test_rating_term_boundaries() {
        let features = CandidateFeatures::default();
        let scored = score_candidates(
            vec![
                manga(1, Some(8.0), None),
                manga(2, Some(3.0), None),
                manga(3, Some(1.5), None),
                manga(4, Some(6.5), None),
            ],
            &features,
            &seed_profile(),
        );

        let rating_of = |id: i32| {
            scored
                .iter()
                .find(|s| s.manga_id == id)
                .map(|s| s.details.rating_score)
                .unwrap()
        };
        assert_eq!(rating_of(1), 5.0);
        assert_eq!(rating_of(2), 0.0);
        assert_eq!(rating_of(3), 0.0);
        assert_eq!(rating_of(4), 3.5);
    }

    #[test]
    fn test_year_term_boundaries() {
        let features = CandidateFeatures::default();
        let scored = score_candidates(
            vec![
                manga(1, None, Some(2015)),
                manga(2, None, Some(2005)),
                manga(3, None, Some(1990)),
                manga(4, None, Some(2019)),
            ],
            &features,
            &seed_profile(),
        );

        let year_of = |id: i32| {
            scored
                .iter()
                .find(|s| s.manga_id == id)
                .map(|s| s.details.year_score)
                .unwrap()
        };
        assert_eq!(year_of(1), 5.0);
        assert_eq!(year_of(2), 0.0);
        assert_eq!(year_of(3), 0.0);
        assert_eq!(year_of(4), 3.0);
    }

    #[test]
    fn test_candidate_without_overlap_or_data_scores_zero_and_is_kept() {
        let scored = score_candidates(
            vec![manga(9, None, None)],
            &CandidateFeatures::default(),
            &seed_profile(),
        );

        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].score, 0.0);
        assert_eq!(scored[0].details, ScoreDetails::default());
    }

    #[test]
    fn test_missing_seed_aggregates_zero_proximity_terms() {
        let profile = MetadataProfile {
            genres: vec![ACTION].into_iter().collect(),
            ..Default::default()
        };
        let scored = score_candidates(
            vec![manga(1, Some(8.0), Some(2015))],
            &features(&[("genre", 1, ACTION)]),
            &profile,
        );

        assert_eq!(scored[0].details.rating_score, 0.0);
        assert_eq!(scored[0].details.year_score, 0.0);
        assert_eq!(scored[0].score, 2.0);
    }

    #[test]
    fn test_ranking_descends_and_breaks_ties_by_id() {
        let features = features(&[("genre", 7, ACTION), ("genre", 2, ACTION)]);
        let scored = score_candidates(
            vec![
                manga(9, None, None),
                manga(7, None, None),
                manga(2, None, None),
            ],
            &features,
            &seed_profile(),
        );

        let ids: Vec<i32> = scored.iter().map(|s| s.manga_id).collect();
        assert_eq!(ids, vec![2, 7, 9]);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let features = features(&[("genre", 1, ACTION), ("demo", 2, SHOUNEN)]);
        let candidates = vec![
            manga(1, Some(7.3), Some(2011)),
            manga(2, Some(8.9), Some(2016)),
            manga(3, Some(8.0), None),
        ];

        let first = score_candidates(candidates.clone(), &features, &seed_profile());
        let second = score_candidates(candidates, &features, &seed_profile());
        assert_eq!(first, second);
    }

    #[test]
    fn test_score_rounded_to_two_decimals() {
        let profile = MetadataProfile {
            external_ratings: vec![7.0, 8.0, 8.0],
            ..Default::default()
        };
        let scored = score_candidates(
            vec![manga(1, Some(8.0), None)],
            &CandidateFeatures::default(),
            &profile,
        );

        assert_eq!(scored[0].score, 4.67);
        assert!((scored[0].details.rating_score - (5.0 - 1.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_half_cent_score_rounds_to_even() {
        let profile = MetadataProfile {
            external_ratings: vec![7.0, 7.5, 7.5, 8.5],
            ..Default::default()
        };
        let scored = score_candidates(
            vec![manga(1, Some(8.0), None)],
            &CandidateFeatures::default(),
            &profile,
        );

        assert_eq!(scored[0].details.rating_score, 4.625);
        assert_eq!(scored[0].score, 4.62);
    }
}
