pub mod cache;
pub mod postgres;
pub mod redis;

pub use cache::{CacheKey, CacheStore};
pub use postgres::{create_pool, MangaRepository, PgMangaRepository};
pub use redis::create_redis_client;
pub use redis::Cache;
