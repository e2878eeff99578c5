pub mod recommendation;
pub mod recommendations;

pub use recommendation::{RecommendationGenerator, RecommendationLimits};
pub use recommendations::RecommendationService;
