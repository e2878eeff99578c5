use redis::AsyncCommands;
use redis::Client;
use tokio::sync::{mpsc, oneshot};

use crate::db::cache::{CacheKey, CacheStore};
use crate::error::{AppError, AppResult};

/// Creates a Redis client for caching
///
/// Connections are multiplexed per call via the tokio-comp feature.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Mutation applied by the cache writer, in the order it was queued
enum CacheCommand {
    Set {
        key: String,
        value: String,
    },
    Delete {
        keys: Vec<String>,
        done: oneshot::Sender<AppResult<()>>,
    },
}

/// Redis-backed [`CacheStore`]
///
/// Every mutation goes through one background writer so a delete can never
/// overtake an earlier write of the same key. Writes are fire-and-forget;
/// deletes wait until Redis has applied them. Reads go straight to Redis.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheCommand>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task to flush pending commands and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates a new Cache and spawns its background writer
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            write_tx,
        };

        (cache, CacheWriterHandle { shutdown_tx })
    }

    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheCommand>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                // Drain queued commands before honouring shutdown.
                biased;

                Some(command) = write_rx.recv() => {
                    Self::apply(&client, command).await;
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    let mut flushed = 0usize;
                    while let Some(command) = write_rx.recv().await {
                        Self::apply(&client, command).await;
                        flushed += 1;
                    }

                    tracing::info!(flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn apply(client: &Client, command: CacheCommand) {
        match command {
            CacheCommand::Set { key, value } => {
                match Self::write_to_redis(client, &key, value).await {
                    Ok(()) => tracing::debug!(cache_key = %key, "Cached value written"),
                    Err(e) => {
                        tracing::warn!(cache_key = %key, error = %e, "Failed to write to Redis cache")
                    }
                }
            }
            CacheCommand::Delete { keys, done } => {
                let result = Self::delete_from_redis(client, keys).await;
                // The caller may have given up waiting; the delete still happened.
                let _ = done.send(result);
            }
        }
    }

    async fn write_to_redis(client: &Client, key: &str, value: String) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn delete_from_redis(client: &Client, keys: Vec<String>) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(keys).await?;
        Ok(())
    }

    async fn queue_delete(&self, keys: Vec<String>) -> AppResult<()> {
        let (done, applied) = oneshot::channel();
        self.write_tx
            .send(CacheCommand::Delete { keys, done })
            .map_err(|_| AppError::Internal("cache writer stopped".to_string()))?;

        applied
            .await
            .map_err(|_| AppError::Internal("cache writer dropped a delete".to_string()))?
    }
}

#[async_trait::async_trait]
impl CacheStore for Cache {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;
        Ok(cached)
    }

    async fn set(&self, key: &CacheKey, value: String) -> AppResult<()> {
        let command = CacheCommand::Set {
            key: key.to_string(),
            value,
        };

        if self.write_tx.send(command).is_err() {
            tracing::warn!(cache_key = %key, "Cache writer stopped, dropping write");
        }
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> AppResult<()> {
        self.queue_delete(vec![key.to_string()]).await
    }

    async fn delete_many(&self, keys: &[CacheKey]) -> AppResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        self.queue_delete(keys.iter().map(ToString::to_string).collect())
            .await
    }
}
