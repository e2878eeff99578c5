use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{RecommendationOutcome, ScoredRecommendation, SeedSummary},
};

const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    #[default]
    Score,
    Title,
    ExternalAverageRating,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

/// Ordering and pagination query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub order_by: OrderField,
    #[serde(default)]
    pub order_dir: OrderDirection,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_size")]
    pub size: usize,
}

fn default_page() -> usize {
    1
}

fn default_size() -> usize {
    20
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            order_by: OrderField::default(),
            order_dir: OrderDirection::default(),
            page: default_page(),
            size: default_size(),
        }
    }
}

/// One page of recommendations
#[derive(Debug, Serialize)]
pub struct RecommendationPage {
    pub total_results: usize,
    pub page: usize,
    pub size: usize,
    pub items: Vec<ScoredRecommendation>,
    #[serde(flatten)]
    pub seeds: Option<SeedSummary>,
}

impl ListParams {
    fn validate(&self) -> AppResult<()> {
        if self.page < 1 {
            return Err(AppError::BadRequest("page must be at least 1".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.size) {
            return Err(AppError::BadRequest(format!(
                "size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }

    /// Orders the engine's flat result and cuts out the requested page
    pub fn paginate(&self, outcome: RecommendationOutcome) -> AppResult<RecommendationPage> {
        self.validate()?;

        let mut items = outcome.items;
        sort_items(&mut items, self.order_by, self.order_dir);

        let total_results = items.len();
        let offset = (self.page - 1).saturating_mul(self.size).min(total_results);
        let items: Vec<ScoredRecommendation> =
            items.into_iter().skip(offset).take(self.size).collect();

        Ok(RecommendationPage {
            total_results,
            page: self.page,
            size: self.size,
            items,
            seeds: outcome.seeds,
        })
    }
}

/// Sorts by the requested field with the case-folded title as secondary key
///
/// A missing rating sorts lowest. Descending reverses both keys.
pub fn sort_items(items: &mut [ScoredRecommendation], field: OrderField, dir: OrderDirection) {
    items.sort_by(|a, b| {
        let ordering = compare(a, b, field);
        match dir {
            OrderDirection::Asc => ordering,
            OrderDirection::Desc => ordering.reverse(),
        }
    });
}

fn compare(a: &ScoredRecommendation, b: &ScoredRecommendation, field: OrderField) -> Ordering {
    let title_order = || a.title.to_lowercase().cmp(&b.title.to_lowercase());

    let primary = match field {
        OrderField::Score => a.score.total_cmp(&b.score),
        OrderField::Title => title_order(),
        OrderField::ExternalAverageRating => {
            match (a.external_average_rating, b.external_average_rating) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
            }
        }
    };

    primary.then_with(title_order)
}
