//! Retry and request pacing for the platform adapters.
//!
//! [`retry_with_backoff`] retries transient failures (429, 5xx, connect and
//! timeout errors) with exponential back-off and jitter. [`Pacer`] spaces
//! requests so an adapter stays under its requests-per-minute allowance.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::IngestError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &IngestError) -> bool {
    match err {
        IngestError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        IngestError::RateLimited { .. } => true,
        IngestError::UnexpectedStatus { status, .. } => *status >= 500,
        IngestError::Deserialize { .. } | IngestError::Conversion { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The delay before retry `n` is `backoff_base_ms * 2^(n-1)` scaled by a
/// random factor in `[0.75, 1.25)`, never shorter than a server-supplied
/// `Retry-After` and capped at 60 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, IngestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, IngestError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = backoff_delay_ms(backoff_base_ms, attempt, &err);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient ingest error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

fn backoff_delay_ms(backoff_base_ms: u64, attempt: u32, err: &IngestError) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let factor = rand::random::<f64>() * 0.5 + 0.75;
    let jittered = (computed.min(MAX_DELAY_MS) as f64 * factor) as u64;

    let floor_ms = match err {
        IngestError::RateLimited {
            retry_after_secs: Some(secs),
            ..
        } => secs.saturating_mul(1_000),
        _ => 0,
    };
    jittered.max(floor_ms).min(MAX_DELAY_MS)
}

/// Spaces requests evenly to honour a requests-per-minute allowance.
///
/// A limit of zero disables pacing.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    #[must_use]
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let interval = if requests_per_minute == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(60) / requests_per_minute
        };
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next request slot is free, then claim it.
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }
        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();
        let slot = match *next_slot {
            Some(at) => at.max(now),
            None => now,
        };
        if slot > now {
            tracing::debug!(
                wait_ms = u64::try_from((slot - now).as_millis()).unwrap_or(u64::MAX),
                "pacing request"
            );
            tokio::time::sleep_until(slot).await;
        }
        *next_slot = Some(slot + self.interval);
    }
}
