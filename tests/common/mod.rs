#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum_test::TestServer;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use uuid::Uuid;

use manga_recs::{
    db::{CacheKey, CacheStore, MangaRepository},
    error::{AppError, AppResult},
    middleware::RecommendationRateLimiter,
    models::{CandidateQuery, Manga, Membership},
    routes::{create_router, AppState},
    services::{RecommendationLimits, RecommendationService},
};

/// Catalog held in memory, built up front and read-only afterwards
#[derive(Default)]
pub struct InMemoryRepository {
    manga: BTreeMap<i32, Manga>,
    links: HashMap<Membership, Vec<(i32, i32)>>,
    collections: BTreeMap<i32, (Uuid, Vec<i32>)>,
}

impl InMemoryRepository {
    pub fn with_manga(mut self, manga_id: i32, rating: Option<f64>, year: Option<i32>) -> Self {
        self.manga.insert(
            manga_id,
            Manga {
                manga_id,
                title: format!("Manga {}", manga_id),
                external_average_rating: rating,
                published_date: year.and_then(|y| NaiveDate::from_ymd_opt(y, 3, 15)),
                cover_image_url: Some(format!("https://covers.example/{}.jpg", manga_id)),
            },
        );
        self
    }

    pub fn with_title(mut self, manga_id: i32, title: &str) -> Self {
        if let Some(manga) = self.manga.get_mut(&manga_id) {
            manga.title = title.to_string();
        }
        self
    }

    pub fn with_link(mut self, membership: Membership, manga_id: i32, attribute_id: i32) -> Self {
        self.links
            .entry(membership)
            .or_default()
            .push((manga_id, attribute_id));
        self
    }

    pub fn with_collection(mut self, collection_id: i32, owner: Uuid, manga_ids: Vec<i32>) -> Self {
        self.collections.insert(collection_id, (owner, manga_ids));
        self
    }

    fn pairs(&self, membership: Membership) -> &[(i32, i32)] {
        self.links
            .get(&membership)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn has_any(&self, membership: Membership, manga_id: i32, ids: &[i32]) -> bool {
        self.pairs(membership)
            .iter()
            .any(|(m, a)| *m == manga_id && ids.contains(a))
    }
}

#[async_trait::async_trait]
impl MangaRepository for InMemoryRepository {
    async fn fetch_membership(
        &self,
        membership: Membership,
        manga_ids: &[i32],
    ) -> AppResult<Vec<(i32, i32)>> {
        Ok(self
            .pairs(membership)
            .iter()
            .filter(|(m, _)| manga_ids.contains(m))
            .copied()
            .collect())
    }

    async fn fetch_external_ratings(&self, manga_ids: &[i32]) -> AppResult<Vec<(i32, Option<f64>)>> {
        Ok(manga_ids
            .iter()
            .filter_map(|id| self.manga.get(id))
            .map(|m| (m.manga_id, m.external_average_rating))
            .collect())
    }

    async fn fetch_published_dates(
        &self,
        manga_ids: &[i32],
    ) -> AppResult<Vec<(i32, Option<NaiveDate>)>> {
        Ok(manga_ids
            .iter()
            .filter_map(|id| self.manga.get(id))
            .map(|m| (m.manga_id, m.published_date))
            .collect())
    }

    async fn fetch_candidates(&self, query: &CandidateQuery) -> AppResult<Vec<Manga>> {
        Ok(self
            .manga
            .values()
            .filter(|m| !query.excluded_ids.contains(&m.manga_id))
            .filter(|m| m.external_average_rating.is_some())
            .filter(|m| {
                self.has_any(Membership::Genre, m.manga_id, &query.genre_ids)
                    || self.has_any(Membership::Tag, m.manga_id, &query.tag_ids)
                    || self.has_any(Membership::Demographic, m.manga_id, &query.demographic_ids)
            })
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn collection_owned_by(&self, user_id: Uuid, collection_id: i32) -> AppResult<bool> {
        Ok(self
            .collections
            .get(&collection_id)
            .is_some_and(|(owner, _)| *owner == user_id))
    }

    async fn fetch_collection_manga_ids(
        &self,
        user_id: Uuid,
        collection_id: i32,
    ) -> AppResult<Vec<i32>> {
        match self.collections.get(&collection_id) {
            Some((owner, ids)) if *owner == user_id => {
                let mut seen = HashSet::new();
                Ok(ids.iter().copied().filter(|id| seen.insert(*id)).collect())
            }
            _ => Err(AppError::NotFound("Collection not found.".to_string())),
        }
    }

    async fn fetch_user_collection_ids(&self, user_id: Uuid) -> AppResult<Vec<i32>> {
        Ok(self
            .collections
            .iter()
            .filter(|(_, (owner, _))| *owner == user_id)
            .map(|(id, _)| *id)
            .collect())
    }
}

/// Cache backed by a map, with a switch that makes every call fail
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl InMemoryCache {
    pub fn failing() -> Self {
        let cache = Self::default();
        cache.failing.store(true, Ordering::SeqCst);
        cache
    }

    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().await.contains_key(&key.to_string())
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    fn check(&self) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal("cache unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<String>> {
        self.check()?;
        Ok(self.entries.lock().await.get(&key.to_string()).cloned())
    }

    async fn set(&self, key: &CacheKey, value: String) -> AppResult<()> {
        self.check()?;
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> AppResult<()> {
        self.check()?;
        self.entries.lock().await.remove(&key.to_string());
        Ok(())
    }

    async fn delete_many(&self, keys: &[CacheKey]) -> AppResult<()> {
        self.check()?;
        let mut entries = self.entries.lock().await;
        for key in keys {
            entries.remove(&key.to_string());
        }
        Ok(())
    }
}

pub fn create_test_server(
    repo: InMemoryRepository,
    cache: Arc<InMemoryCache>,
    limits: RecommendationLimits,
) -> TestServer {
    create_rate_limited_server(repo, cache, limits, 10_000)
}

/// Test server whose generation endpoints allow `per_minute` requests
pub fn create_rate_limited_server(
    repo: InMemoryRepository,
    cache: Arc<InMemoryCache>,
    limits: RecommendationLimits,
    per_minute: u32,
) -> TestServer {
    let per_minute = NonZeroU32::new(per_minute).unwrap();
    let per_day = NonZeroU32::new(100_000).unwrap();
    let recommendations = RecommendationService::new(Arc::new(repo), cache, limits);
    let app = create_router(Arc::new(AppState {
        recommendations,
        rate_limiter: Arc::new(RecommendationRateLimiter::new(per_minute, per_day)),
    }));
    TestServer::new(app).unwrap()
}
