use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod recommendation;

pub use recommendation::{
    RecommendationOutcome, RecommendationResult, ScoreDetails, ScoredRecommendation, SeedSummary,
};

/// A manga row as read by the recommendation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Manga {
    pub manga_id: i32,
    pub title: String,
    pub external_average_rating: Option<f64>,
    pub published_date: Option<NaiveDate>,
    pub cover_image_url: Option<String>,
}

/// Attribute a manga can be linked to through a many-to-many join table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    Genre,
    Tag,
    Demographic,
    Author,
}

impl Membership {
    /// Join table holding `(manga_id, attribute_id)` pairs
    pub fn table(&self) -> &'static str {
        match self {
            Membership::Genre => "manga_genre",
            Membership::Tag => "manga_tag",
            Membership::Demographic => "manga_demographic",
            Membership::Author => "manga_author",
        }
    }

    /// Attribute id column of the join table
    pub fn column(&self) -> &'static str {
        match self {
            Membership::Genre => "genre_id",
            Membership::Tag => "tag_id",
            Membership::Demographic => "demographic_id",
            Membership::Author => "author_id",
        }
    }
}

/// Filter used to select candidate manga for scoring
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub excluded_ids: Vec<i32>,
    pub genre_ids: Vec<i32>,
    pub tag_ids: Vec<i32>,
    pub demographic_ids: Vec<i32>,
    pub limit: i64,
}

impl CandidateQuery {
    /// True when no attribute could ever match
    pub fn has_no_attributes(&self) -> bool {
        self.genre_ids.is_empty() && self.tag_ids.is_empty() && self.demographic_ids.is_empty()
    }
}
