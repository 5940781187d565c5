//! Connection to the Redis server holding node state.

use redis::aio::ConnectionManager;
use thiserror::Error;
use tracing::debug;

use intuition_core::StoreError;

#[derive(Error, Debug)]
pub enum RedisError {
    #[error("Redis command failed: {0}")]
    Command(#[from] redis::RedisError),

    #[error("Stored document is not valid JSON: {0}")]
    Document(#[from] serde_json::Error),
}

pub type RedisResult<T> = Result<T, RedisError>;

/// Reconnecting multiplexed handle; each store call works on a clone.
pub type RedisPool = ConnectionManager;

/// Open a managed connection to `redis_url` (`redis://host:port[/db]`).
pub async fn connect(redis_url: &str) -> RedisResult<RedisPool> {
    let client = redis::Client::open(redis_url)?;
    let pool = ConnectionManager::new(client).await?;
    debug!("Connected to Redis");
    Ok(pool)
}

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        match err {
            RedisError::Document(e) => StoreError::Serialization(e),
            RedisError::Command(e) => StoreError::backend(e),
        }
    }
}
