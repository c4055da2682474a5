use tokio::{sync::watch, time::{interval, Duration, MissedTickBehavior}};

use crate::limiter::rate_limiter::RateLimiter;

/// Periodically drops rate limit entries whose window has fully expired.
/// Runs until `shutdown` flips to `true` or its sender is dropped.
pub async fn start_rate_limit_sweep(
    limiter: RateLimiter,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        every = %humantime::format_duration(every),
        store = limiter.store_kind(),
        "Rate limit sweep started"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match limiter.purge_expired().await {
                    Ok(0) => tracing::debug!("Rate limit sweep found nothing to purge"),
                    Ok(count) => tracing::info!("Purged {} expired rate limit entries", count),
                    Err(e) => tracing::error!("Rate limit sweep failed: {}", e)
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::info!("Rate limit sweep stopped");
                    break;
                }
            }
        }
    }
}
