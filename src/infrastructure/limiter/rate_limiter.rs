use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    errors::AppError,
    repositories::rate_limit::{DynRateLimitStore, RateLimitEntry, RateLimitStore},
};

/// Fixed window: at most `max_requests` admitted attempts per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: TimeDelta,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: TimeDelta) -> Self {
        Self { max_requests, window }
    }

    /// A window that started at `window_start` is over once strictly more
    /// than `window` has passed.
    pub fn is_expired(&self, window_start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - window_start > self.window
    }

    /// Saturates at the latest representable instant instead of overflowing.
    pub fn reset_time(&self, window_start: DateTime<Utc>) -> DateTime<Utc> {
        window_start
            .checked_add_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(5, TimeDelta::hours(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub reset_time: Option<DateTime<Utc>>,
}

impl RateLimitDecision {
    pub fn allowed() -> Self {
        Self { allowed: true, reset_time: None }
    }

    pub fn rejected(reset_time: DateTime<Utc>) -> Self {
        Self { allowed: false, reset_time: Some(reset_time) }
    }
}

/// Applies a [`RateLimitPolicy`] on top of a pluggable store.
#[derive(Clone)]
pub struct RateLimiter {
    store: DynRateLimitStore,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(store: DynRateLimitStore, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    pub fn store_kind(&self) -> &'static str {
        self.store.kind()
    }

    pub async fn check(&self, key: &str) -> Result<RateLimitDecision, AppError> {
        self.check_at(key, Utc::now()).await
    }

    pub async fn check_at(&self, key: &str, now: DateTime<Utc>) -> Result<RateLimitDecision, AppError> {
        self.store.hit(key, now, &self.policy).await
    }

    pub async fn peek(&self, key: &str) -> Result<Option<RateLimitEntry>, AppError> {
        self.store.peek(key, &self.policy).await
    }

    pub async fn purge_expired(&self) -> Result<usize, AppError> {
        self.purge_expired_at(Utc::now()).await
    }

    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        self.store.purge_expired(now, &self.policy).await
    }
}

/// Process-local store. Each key's check-and-update runs under the map's
/// shard lock, so concurrent hits from one address never overshoot the limit.
#[derive(Clone, Default)]
pub struct InMemoryRateLimitStore {
    map: Arc<DashMap<String, RateLimitEntry>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, AppError> {
        let fresh = RateLimitEntry { window_start: now, count: 1 };

        let decision = match self.map.entry(key.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(fresh);
                RateLimitDecision::allowed()
            }
            Entry::Occupied(mut entry) => {
                let current = entry.get_mut();
                if policy.is_expired(current.window_start, now) {
                    *current = fresh;
                    RateLimitDecision::allowed()
                } else if current.count < policy.max_requests {
                    current.count += 1;
                    RateLimitDecision::allowed()
                } else {
                    RateLimitDecision::rejected(policy.reset_time(current.window_start))
                }
            }
        };

        Ok(decision)
    }

    async fn peek(
        &self,
        key: &str,
        _policy: &RateLimitPolicy,
    ) -> Result<Option<RateLimitEntry>, AppError> {
        Ok(self.map.get(key).map(|entry| *entry.value()))
    }

    async fn purge_expired(
        &self,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<usize, AppError> {
        let mut purged = 0;
        self.map.retain(|_, entry| {
            let keep = !policy.is_expired(entry.window_start, now);
            if !keep {
                purged += 1;
            }
            keep
        });
        Ok(purged)
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
