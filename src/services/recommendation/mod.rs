//! Content-based recommendation engine
//!
//! A request flows through four steps: resolve the seed manga, build a
//! metadata profile from them, select candidates sharing that metadata, then
//! score and rank the candidates. [`RecommendationGenerator`] composes them.

pub mod candidates;
pub mod generator;
pub mod profile;
pub mod scoring;
pub mod seeds;

pub use generator::RecommendationGenerator;
pub use profile::{FrequencyMap, MetadataProfile};
pub use seeds::SeedSet;

/// Caps applied to every generator run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationLimits {
    /// Seeds beyond this count are dropped before profiling
    pub max_seeds: usize,
    /// Soft cap on candidates fetched for scoring
    pub max_candidates: i64,
}

impl Default for RecommendationLimits {
    fn default() -> Self {
        Self {
            max_seeds: 100,
            max_candidates: 2000,
        }
    }
}
