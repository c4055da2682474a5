use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;

use crate::{
    errors::AppError,
    limiter::rate_limiter::{RateLimitDecision, RateLimitPolicy},
    repositories::rate_limit::{RateLimitEntry, RateLimitStore},
};

const KEY_PREFIX: &str = "rl:contact";

/// Shared store for deployments running several instances. Windows expire
/// through Redis key TTLs, so the sweep has nothing to do here.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    pool: Pool,
}

impl RedisRateLimitStore {
    pub fn connect(url: &str) -> Result<Self, AppError> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| AppError::InternalError(format!("Redis pool creation error: {}", e)))?;

        Ok(Self::new(pool))
    }

    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Addresses are URL-encoded to keep the Redis key safe.
    fn key(address: &str) -> String {
        format!("{}:{}", KEY_PREFIX, urlencoding::encode(address))
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, AppError> {
        let redis_key = Self::key(key);
        let window_ms = policy.window.num_milliseconds();
        let mut conn = self.pool.get().await?;

        let (count, mut ttl_ms): (u32, i64) = redis::pipe()
            .atomic()
            .incr(&redis_key, 1)
            .pttl(&redis_key)
            .query_async(&mut conn)
            .await?;

        // -1 means the key has no expiry yet: this hit opened the window, or
        // a previous opener died before setting it
        if ttl_ms < 0 {
            let _: () = conn.pexpire(&redis_key, window_ms).await?;
            ttl_ms = window_ms;
        }

        if count <= policy.max_requests {
            Ok(RateLimitDecision::allowed())
        } else {
            Ok(RateLimitDecision::rejected(now + TimeDelta::milliseconds(ttl_ms)))
        }
    }

    async fn peek(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
    ) -> Result<Option<RateLimitEntry>, AppError> {
        let redis_key = Self::key(key);
        let mut conn = self.pool.get().await?;

        let (count, ttl_ms): (Option<u32>, i64) = redis::pipe()
            .get(&redis_key)
            .pttl(&redis_key)
            .query_async(&mut conn)
            .await?;

        Ok(count.map(|count| {
            let remaining = TimeDelta::milliseconds(ttl_ms.max(0));
            RateLimitEntry {
                window_start: Utc::now() + remaining - policy.window,
                count: count.min(policy.max_requests),
            }
        }))
    }

    async fn purge_expired(
        &self,
        _now: DateTime<Utc>,
        _policy: &RateLimitPolicy,
    ) -> Result<usize, AppError> {
        Ok(0)
    }

    fn kind(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_prefixed_and_encoded() {
        assert_eq!(RedisRateLimitStore::key("10.0.0.1"), "rl:contact:10.0.0.1");
        assert_eq!(
            RedisRateLimitStore::key("2001:db8::1"),
            "rl:contact:2001%3Adb8%3A%3A1"
        );
    }
}
