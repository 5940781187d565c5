//! Static data store backed by Redis.
//!
//! Layout: hash `intuition:{node}:static` holds the JSON document in field
//! `data`; set `intuition:nodes` lists every node with stored data.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use intuition_core::{StateStore, StaticData, StoreError};

use crate::client::{RedisPool, RedisResult};

const NODES_KEY: &str = "intuition:nodes";
const DATA_FIELD: &str = "data";

fn static_key(node: &str) -> String {
    format!("intuition:{}:static", node)
}

/// [`StateStore`] persisting to Redis.
#[derive(Clone)]
pub struct RedisStateStore {
    pool: RedisPool,
}

impl RedisStateStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    async fn get_data(&self, node: &str) -> RedisResult<StaticData> {
        let mut conn = self.pool.clone();
        let json: Option<String> = conn.hget(static_key(node), DATA_FIELD).await?;
        match json {
            Some(j) => Ok(serde_json::from_str(&j)?),
            None => Ok(StaticData::new()),
        }
    }

    async fn set_data(&self, node: &str, data: &StaticData) -> RedisResult<()> {
        let mut conn = self.pool.clone();
        let json = serde_json::to_string(data)?;
        conn.hset::<_, _, _, ()>(static_key(node), DATA_FIELD, &json).await?;
        conn.sadd::<_, _, ()>(NODES_KEY, node).await?;
        debug!(node = %node, bytes = json.len(), "Static data saved to Redis");
        Ok(())
    }

    async fn delete_data(&self, node: &str) -> RedisResult<bool> {
        let mut conn = self.pool.clone();
        let deleted: i64 = conn.del(static_key(node)).await?;
        conn.srem::<_, _, ()>(NODES_KEY, node).await?;
        Ok(deleted > 0)
    }

    async fn list_nodes(&self) -> RedisResult<Vec<String>> {
        let mut conn = self.pool.clone();
        let mut nodes: Vec<String> = conn.smembers(NODES_KEY).await?;
        nodes.sort();
        Ok(nodes)
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn load(&self, node: &str) -> Result<StaticData, StoreError> {
        Ok(self.get_data(node).await?)
    }

    async fn save(&self, node: &str, data: &StaticData) -> Result<(), StoreError> {
        Ok(self.set_data(node, data).await?)
    }

    async fn reset(&self, node: &str) -> Result<bool, StoreError> {
        Ok(self.delete_data(node).await?)
    }

    async fn nodes(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.list_nodes().await?)
    }
}
