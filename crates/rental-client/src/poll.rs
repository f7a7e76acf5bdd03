use std::future::Future;
use std::time::Duration;

use rental_types::domain::errors::BookingError;
use tokio::time::Instant;

use crate::cancel::CancellationToken;

/// Bounds for a poll loop: the first wait is `interval`, each following wait
/// grows by `backoff_multiplier` (never below 1.0) up to `max_interval`, and the loop gives up
/// once `max_duration` has elapsed.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub backoff_multiplier: f64,
    pub max_interval: Duration,
    pub max_duration: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            backoff_multiplier: 1.5,
            max_interval: Duration::from_secs(15),
            max_duration: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Ready(T),
    TimedOut,
    Cancelled,
}

/// Runs `probe` until it yields a value, the time budget runs out, or the
/// token is cancelled. Transient probe failures count as "not ready yet";
/// any other failure ends the loop.
pub async fn poll_with_backoff<T, F, Fut>(
    config: &PollConfig,
    token: &CancellationToken,
    mut probe: F,
) -> Result<PollOutcome<T>, BookingError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, BookingError>>,
{
    let deadline = Instant::now() + config.max_duration;
    let mut delay = config.interval;
    let mut attempt: u32 = 0;

    loop {
        if token.is_cancelled() {
            return Ok(PollOutcome::Cancelled);
        }
        attempt += 1;
        match probe().await {
            Ok(Some(value)) => return Ok(PollOutcome::Ready(value)),
            Ok(None) => {}
            Err(e) if e.is_transient() => {
                tracing::warn!(attempt, error = %e, "poll probe failed, will retry");
            }
            Err(e) => return Err(e),
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::info!(attempt, "poll timed out");
            return Ok(PollOutcome::TimedOut);
        }
        let wait = delay.min(deadline - now);
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = token.cancelled() => return Ok(PollOutcome::Cancelled),
        }
        delay = Duration::from_secs_f64(
            (delay.as_secs_f64() * config.backoff_multiplier.max(1.0))
                .min(config.max_interval.as_secs_f64()),
        );
    }
}
