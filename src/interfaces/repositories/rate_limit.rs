use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    errors::AppError,
    limiter::rate_limiter::{RateLimitDecision, RateLimitPolicy},
};

pub type DynRateLimitStore = Arc<dyn RateLimitStore>;

/// Counting window for one client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub window_start: DateTime<Utc>,
    pub count: u32,
}

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Records an attempt from `key` at `now` and decides whether to admit it.
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, AppError>;

    /// Current window for `key`, without counting an attempt.
    async fn peek(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
    ) -> Result<Option<RateLimitEntry>, AppError>;

    /// Drops windows that ended before `now`. Returns how many were removed.
    async fn purge_expired(
        &self,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<usize, AppError>;

    fn kind(&self) -> &'static str;
}
