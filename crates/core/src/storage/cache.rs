use anyhow::Context;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Key-value cache with per-entry expiry. Values are opaque serialized strings.
#[async_trait::async_trait]
pub trait FastCache: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set(&self, key: &str, ttl: Duration, value: &str) -> anyhow::Result<()>;

    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url).context("invalid REDIS_URL")?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .context("redis connect failed")?;
        Ok(Self { conn })
    }
}

#[async_trait::async_trait]
impl FastCache for RedisCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(key)
            .await
            .with_context(|| format!("redis GET {key} failed"))?;
        Ok(value)
    }

    async fn set(&self, key: &str, ttl: Duration, value: &str) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        // SETEX rejects a zero expiry.
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, secs)
            .await
            .with_context(|| format!("redis SETEX {key} failed"))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .with_context(|| format!("redis DEL {key} failed"))?;
        Ok(())
    }
}

/// In-process cache used when Redis is not configured or unreachable.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: tokio::sync::RwLock<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl FastCache for MemoryCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        {
            let entries = self.entries.read().await;
            let Some((value, expires_at)) = entries.get(key) else {
                return Ok(None);
            };
            if Instant::now() < *expires_at {
                return Ok(Some(value.clone()));
            }
        }

        // Expired: evict unless a writer refreshed the entry in between.
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|(_, expires_at)| Instant::now() >= *expires_at)
        {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, ttl: Duration, value: &str) -> anyhow::Result<()> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
