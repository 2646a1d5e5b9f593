//! Redis cache wrapper

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;

/// Errors raised by cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Invalid Redis URL
    #[error("Invalid cache URL: {0}")]
    InvalidUrl(String),

    /// Connection or command failure
    #[error("Cache error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Key under which a user's Google access token is kept
pub fn google_token_key(user_id: &str) -> String {
    format!("google_token:{}", user_id)
}

/// Minimal string cache used by the use cases
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn store(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;
}

/// Shared handle to a Redis server.
///
/// Clones share one multiplexed connection that reconnects on its own.
#[derive(Clone)]
pub struct CacheService {
    conn: ConnectionManager,
}

impl CacheService {
    /// Open a connection manager for `url` and verify it with PING
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::InvalidUrl(e.to_string()))?;
        let conn = client.get_connection_manager().await?;

        let service = Self { conn };
        service.ping().await?;

        tracing::info!("connected to redis");
        Ok(service)
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    /// Set a string value, optionally expiring after `expiration`
    pub async fn set(
        &self,
        key: &str,
        value: &str,
        expiration: Option<Duration>,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        match expiration {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    /// Get a string value; `None` when the key does not exist
    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    /// Delete a key, returning whether it existed
    pub async fn del(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    pub async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }

    /// Set a TTL on an existing key, returning whether the key exists
    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Ok(conn.expire(key, seconds).await?)
    }

    pub async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(key, field, value).await?;
        Ok(())
    }

    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.hget(key, field).await?)
    }

    pub async fn hget_all(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.hgetall(key).await?)
    }

    /// Remove a hash field, returning whether it existed
    pub async fn hdel(&self, key: &str, field: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.hdel(key, field).await?;
        Ok(removed > 0)
    }
}

#[async_trait]
impl KeyValueCache for CacheService {
    async fn fetch(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.get(key).await
    }

    async fn store(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.set(key, value, ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_token_key() {
        assert_eq!(google_token_key("user-1"), "google_token:user-1");
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        match CacheService::connect("not a url").await {
            Err(CacheError::InvalidUrl(_)) => {}
            Err(other) => panic!("Expected InvalidUrl, got {:?}", other),
            Ok(_) => panic!("Expected connection to fail"),
        }
    }

    #[tokio::test]
    #[ignore] // Requires a running Redis at REDIS_URL
    async fn test_string_and_hash_commands() {
        dotenvy::dotenv().ok();
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let cache = CacheService::connect(&url).await.unwrap();

        cache.set("test:key", "value", Some(Duration::from_secs(30))).await.unwrap();
        assert_eq!(cache.get("test:key").await.unwrap().as_deref(), Some("value"));
        assert!(cache.exists("test:key").await.unwrap());
        assert!(cache.expire("test:key", Duration::from_secs(60)).await.unwrap());
        assert!(cache.del("test:key").await.unwrap());
        assert_eq!(cache.get("test:key").await.unwrap(), None);

        cache.hset("test:hash", "a", "1").await.unwrap();
        cache.hset("test:hash", "b", "2").await.unwrap();
        assert_eq!(cache.hget("test:hash", "a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(cache.hget_all("test:hash").await.unwrap().len(), 2);
        assert!(cache.hdel("test:hash", "a").await.unwrap());
        assert!(cache.del("test:hash").await.unwrap());
    }
}
