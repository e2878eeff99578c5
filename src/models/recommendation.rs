use serde::{Deserialize, Serialize};

/// Per-term breakdown of a recommendation score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetails {
    pub genre_score: f64,
    pub tag_score: f64,
    pub demo_score: f64,
    pub author_score: f64,
    pub rating_score: f64,
    pub year_score: f64,
}

impl ScoreDetails {
    pub fn total(&self) -> f64 {
        self.genre_score
            + self.tag_score
            + self.demo_score
            + self.author_score
            + self.rating_score
            + self.year_score
    }
}

/// A candidate manga with its computed score, as returned to clients and cached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecommendation {
    pub manga_id: i32,
    pub title: String,
    pub external_average_rating: Option<f64>,
    pub cover_image_url: Option<String>,
    /// Sum of all terms, rounded to two decimals
    pub score: f64,
    pub details: ScoreDetails,
}

/// How the seed set was resolved before profiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub seed_total: usize,
    pub seed_used: usize,
    pub seed_truncated: bool,
}

/// Output of one generator run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub items: Vec<ScoredRecommendation>,
    #[serde(flatten)]
    pub seeds: SeedSummary,
}

/// Items served to a caller, with the seed summary when the generator actually ran
///
/// Cache hits only store the items, so `seeds` is `None` for them.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationOutcome {
    pub items: Vec<ScoredRecommendation>,
    pub seeds: Option<SeedSummary>,
}

impl From<RecommendationResult> for RecommendationOutcome {
    fn from(result: RecommendationResult) -> Self {
        Self {
            items: result.items,
            seeds: Some(result.seeds),
        }
    }
}
