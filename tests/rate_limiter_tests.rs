use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use contact_backend::{
    background_task::start_rate_limit_sweep,
    email::{dispatcher::EmailDispatcher, log_sender::LogEmailSender},
    errors::AppError,
    limiter::rate_limiter::{InMemoryRateLimitStore, RateLimitDecision, RateLimitPolicy, RateLimiter},
    repositories::rate_limit::{RateLimitEntry, RateLimitStore},
    settings::AppConfig,
    use_cases::contact::ContactHandler,
};
use futures::future::join_all;
use tokio::sync::watch;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
}

fn limiter() -> (RateLimiter, InMemoryRateLimitStore) {
    let store = InMemoryRateLimitStore::new();
    let limiter = RateLimiter::new(Arc::new(store.clone()), RateLimitPolicy::default());
    (limiter, store)
}

#[tokio::test]
async fn admits_five_then_rejects_until_window_ends() {
    let (limiter, _) = limiter();
    let t0 = start();

    for i in 0..5 {
        let decision = limiter.check_at("10.0.0.1", t0 + TimeDelta::minutes(i)).await.unwrap();
        assert!(decision.allowed, "call {}", i + 1);
        assert_eq!(decision.reset_time, None);
    }

    let sixth = limiter.check_at("10.0.0.1", t0 + TimeDelta::minutes(10)).await.unwrap();
    assert!(!sixth.allowed);
    assert_eq!(sixth.reset_time, Some(t0 + TimeDelta::hours(1)));
}

#[tokio::test]
async fn window_resets_after_reset_time() {
    let (limiter, _) = limiter();
    let t0 = start();

    for _ in 0..6 {
        limiter.check_at("10.0.0.2", t0).await.unwrap();
    }

    // Exactly at the reset time the window is still running
    let at_reset = limiter.check_at("10.0.0.2", t0 + TimeDelta::hours(1)).await.unwrap();
    assert!(!at_reset.allowed);

    let later = t0 + TimeDelta::hours(1) + TimeDelta::milliseconds(1);
    let after_reset = limiter.check_at("10.0.0.2", later).await.unwrap();
    assert!(after_reset.allowed);

    let entry = limiter.peek("10.0.0.2").await.unwrap().unwrap();
    assert_eq!(entry.count, 1);
    assert_eq!(entry.window_start, later);
}

#[tokio::test]
async fn rejected_attempts_do_not_extend_the_window() {
    let (limiter, _) = limiter();
    let t0 = start();

    for i in 0..20 {
        limiter.check_at("10.0.0.3", t0 + TimeDelta::minutes(i)).await.unwrap();
    }

    let entry = limiter.peek("10.0.0.3").await.unwrap().unwrap();
    assert_eq!(entry.count, 5);
    assert_eq!(entry.window_start, t0);
}

#[tokio::test]
async fn policy_parameters_are_respected() {
    let store = InMemoryRateLimitStore::new();
    let limiter = RateLimiter::new(
        Arc::new(store),
        RateLimitPolicy::new(2, TimeDelta::minutes(10)),
    );
    let t0 = start();

    assert!(limiter.check_at("10.0.0.4", t0).await.unwrap().allowed);
    assert!(limiter.check_at("10.0.0.4", t0).await.unwrap().allowed);

    let third = limiter.check_at("10.0.0.4", t0).await.unwrap();
    assert_eq!(third.reset_time, Some(t0 + TimeDelta::minutes(10)));
}

#[tokio::test]
async fn purge_removes_only_expired_windows() {
    let (limiter, store) = limiter();
    let t0 = start();

    limiter.check_at("old", t0).await.unwrap();
    limiter.check_at("recent", t0 + TimeDelta::minutes(30)).await.unwrap();

    let purged = limiter
        .purge_expired_at(t0 + TimeDelta::minutes(61))
        .await
        .unwrap();

    assert_eq!(purged, 1);
    assert_eq!(store.len(), 1);
    assert!(limiter.peek("old").await.unwrap().is_none());
    assert!(limiter.peek("recent").await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checks_never_exceed_the_threshold() {
    let (limiter, _) = limiter();
    let now = Utc::now();

    let checks = (0..50).map(|_| {
        let limiter = limiter.clone();
        tokio::spawn(async move { limiter.check_at("10.0.0.5", now).await.unwrap() })
    });

    let admitted = join_all(checks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .filter(|decision| decision.allowed)
        .count();

    assert_eq!(admitted, 5);
}

#[tokio::test]
async fn sweep_task_purges_and_stops_on_shutdown() {
    let store = InMemoryRateLimitStore::new();
    let limiter = RateLimiter::new(
        Arc::new(store.clone()),
        RateLimitPolicy::new(5, TimeDelta::milliseconds(20)),
    );
    limiter.check("10.0.0.6").await.unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep = tokio::spawn(start_rate_limit_sweep(
        limiter,
        Duration::from_millis(10),
        shutdown_rx,
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(store.is_empty());

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), sweep)
        .await
        .expect("sweep did not stop")
        .unwrap();
}

/// Store that rejects every attempt without saying when the window ends.
struct RejectingStore;

#[async_trait]
impl RateLimitStore for RejectingStore {
    async fn hit(
        &self,
        _key: &str,
        _now: DateTime<Utc>,
        _policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, AppError> {
        Ok(RateLimitDecision { allowed: false, reset_time: None })
    }

    async fn peek(
        &self,
        _key: &str,
        _policy: &RateLimitPolicy,
    ) -> Result<Option<RateLimitEntry>, AppError> {
        Ok(None)
    }

    async fn purge_expired(
        &self,
        _now: DateTime<Utc>,
        _policy: &RateLimitPolicy,
    ) -> Result<usize, AppError> {
        Ok(0)
    }

    fn kind(&self) -> &'static str {
        "rejecting"
    }
}

#[tokio::test]
async fn rejection_without_reset_time_is_still_rate_limited() {
    let config = AppConfig::default();
    let handler = ContactHandler::new(
        RateLimiter::new(Arc::new(RejectingStore), RateLimitPolicy::default()),
        EmailDispatcher::new(LogEmailSender, config.dispatch_config().unwrap()),
    );
    let before = Utc::now();

    let err = handler.submit("10.0.0.9", b"{}").await.unwrap_err();

    match err {
        AppError::RateLimited { reset_time } => {
            assert!(reset_time >= before + TimeDelta::hours(1));
            assert!(reset_time <= Utc::now() + TimeDelta::hours(1));
        }
        other => panic!("expected a rate limit rejection, got {other}"),
    }
}

#[test]
fn reset_time_saturates_instead_of_overflowing() {
    let policy = RateLimitPolicy::new(5, TimeDelta::MAX);

    assert_eq!(policy.reset_time(start()), DateTime::<Utc>::MAX_UTC);
    assert_eq!(
        RateLimitPolicy::default().reset_time(start()),
        start() + TimeDelta::hours(1)
    );
}
