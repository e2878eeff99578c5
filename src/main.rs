use std::{net::SocketAddr, sync::Arc};

use manga_recs::{
    config::Config,
    db::{create_pool, create_redis_client, Cache, PgMangaRepository},
    routes::{create_router, AppState},
    services::RecommendationService,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client);

    let recommendations = RecommendationService::new(
        Arc::new(PgMangaRepository::new(pool)),
        Arc::new(cache),
        config.recommendation_limits(),
    );
    let app = create_router(Arc::new(AppState {
        recommendations,
        rate_limiter: Arc::new(config.rate_limiter()),
    }));

    let address = config.address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        address = %address,
        max_recommendation_seeds = config.max_recommendation_seeds,
        max_candidates = config.max_candidates,
        rate_limit_per_minute = config.rate_limit_per_minute.get(),
        rate_limit_per_day = config.rate_limit_per_day.get(),
        "Server running"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    cache_writer.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
