use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{CandidateQuery, Manga, Membership},
};

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Read-only data access used by the recommendation engine
///
/// Every method is a single bulk fetch. Failures surface as
/// [`AppError::Database`] and are never retried.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MangaRepository: Send + Sync {
    /// Returns `(manga_id, attribute_id)` pairs from a join table for the given manga
    async fn fetch_membership(
        &self,
        membership: Membership,
        manga_ids: &[i32],
    ) -> AppResult<Vec<(i32, i32)>>;

    async fn fetch_external_ratings(&self, manga_ids: &[i32]) -> AppResult<Vec<(i32, Option<f64>)>>;

    async fn fetch_published_dates(
        &self,
        manga_ids: &[i32],
    ) -> AppResult<Vec<(i32, Option<NaiveDate>)>>;

    /// Rated manga outside the excluded set sharing at least one attribute, distinct by id
    async fn fetch_candidates(&self, query: &CandidateQuery) -> AppResult<Vec<Manga>>;

    async fn collection_owned_by(&self, user_id: Uuid, collection_id: i32) -> AppResult<bool>;

    /// Manga linked to a collection, failing with `NotFound` unless `user_id` owns it
    async fn fetch_collection_manga_ids(
        &self,
        user_id: Uuid,
        collection_id: i32,
    ) -> AppResult<Vec<i32>>;

    async fn fetch_user_collection_ids(&self, user_id: Uuid) -> AppResult<Vec<i32>>;
}

#[derive(Clone)]
pub struct PgMangaRepository {
    pool: PgPool,
}

impl PgMangaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CANDIDATES_SQL: &str = r#"
    SELECT m.manga_id,
           m.title,
           m.external_average_rating::float8 AS external_average_rating,
           m.published_date,
           m.cover_image_url
    FROM manga m
    WHERE m.manga_id <> ALL($1)
      AND m.external_average_rating IS NOT NULL
      AND (
          EXISTS (SELECT 1 FROM manga_genre g
                  WHERE g.manga_id = m.manga_id AND g.genre_id = ANY($2))
          OR EXISTS (SELECT 1 FROM manga_tag t
                     WHERE t.manga_id = m.manga_id AND t.tag_id = ANY($3))
          OR EXISTS (SELECT 1 FROM manga_demographic d
                     WHERE d.manga_id = m.manga_id AND d.demographic_id = ANY($4))
      )
    ORDER BY m.manga_id
    LIMIT $5
"#;

#[async_trait::async_trait]
impl MangaRepository for PgMangaRepository {
    async fn fetch_membership(
        &self,
        membership: Membership,
        manga_ids: &[i32],
    ) -> AppResult<Vec<(i32, i32)>> {
        let sql = format!(
            "SELECT manga_id, {} FROM {} WHERE manga_id = ANY($1)",
            membership.column(),
            membership.table()
        );

        let rows = sqlx::query_as::<_, (i32, i32)>(&sql)
            .bind(manga_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn fetch_external_ratings(&self, manga_ids: &[i32]) -> AppResult<Vec<(i32, Option<f64>)>> {
        let rows = sqlx::query_as::<_, (i32, Option<f64>)>(
            "SELECT manga_id, external_average_rating::float8 FROM manga WHERE manga_id = ANY($1)",
        )
        .bind(manga_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn fetch_published_dates(
        &self,
        manga_ids: &[i32],
    ) -> AppResult<Vec<(i32, Option<NaiveDate>)>> {
        let rows = sqlx::query_as::<_, (i32, Option<NaiveDate>)>(
            "SELECT manga_id, published_date FROM manga WHERE manga_id = ANY($1)",
        )
        .bind(manga_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn fetch_candidates(&self, query: &CandidateQuery) -> AppResult<Vec<Manga>> {
        let candidates = sqlx::query_as::<_, Manga>(CANDIDATES_SQL)
            .bind(query.excluded_ids.as_slice())
            .bind(query.genre_ids.as_slice())
            .bind(query.tag_ids.as_slice())
            .bind(query.demographic_ids.as_slice())
            .bind(query.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(candidates)
    }

    async fn collection_owned_by(&self, user_id: Uuid, collection_id: i32) -> AppResult<bool> {
        let owned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM collection WHERE collection_id = $1 AND user_id = $2)",
        )
        .bind(collection_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(owned)
    }

    async fn fetch_collection_manga_ids(
        &self,
        user_id: Uuid,
        collection_id: i32,
    ) -> AppResult<Vec<i32>> {
        if !self.collection_owned_by(user_id, collection_id).await? {
            tracing::warn!(
                user_id = %user_id,
                collection_id,
                "Collection missing or owned by another user"
            );
            return Err(AppError::NotFound("Collection not found.".to_string()));
        }

        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT DISTINCT manga_id FROM manga_collection WHERE collection_id = $1 ORDER BY manga_id",
        )
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn fetch_user_collection_ids(&self, user_id: Uuid) -> AppResult<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT collection_id FROM collection WHERE user_id = $1 ORDER BY collection_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
