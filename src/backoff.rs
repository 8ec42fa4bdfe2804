//! "Full jitter" exponential backoff for rate-limited requests.
//!
//! The delay before retry `n` is drawn uniformly from
//! `0..=min(max, initial * 2^n)`, so concurrent clients spread out instead of
//! retrying in lockstep.

use std::time::Duration;

use rand::Rng;

/// Initial delay ceiling for the first 429 retry, in milliseconds.
pub const INITIAL_RETRY_DELAY_IF_RATE_LIMITED: u64 = 5_000;

/// Upper bound on any single 429 retry delay, in milliseconds.
pub const MAX_RETRY_DELAY_IF_RATE_LIMITED: u64 = 600_000;

/// Delay bounds used when retrying after HTTP 429.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BackoffParameters {
    /// Ceiling for attempt `0`, doubled on each further attempt.
    pub initial_delay_ms: u64,
    /// Hard cap on the ceiling.
    pub max_delay_ms: u64,
}

impl Default for BackoffParameters {
    fn default() -> Self {
        Self {
            initial_delay_ms: INITIAL_RETRY_DELAY_IF_RATE_LIMITED,
            max_delay_ms: MAX_RETRY_DELAY_IF_RATE_LIMITED,
        }
    }
}

impl BackoffParameters {
    /// Draws the delay to wait before re-issuing attempt `num_attempts + 1`.
    pub fn delay_for(&self, num_attempts: u32) -> Duration {
        Duration::from_millis(compute_backoff(
            num_attempts,
            self.initial_delay_ms,
            self.max_delay_ms,
        ))
    }
}

/// Returns a delay in `[0, min(max_delay_ms, initial_delay_ms * 2^num_attempts)]`
/// using the thread-local random source.
pub fn compute_backoff(num_attempts: u32, initial_delay_ms: u64, max_delay_ms: u64) -> u64 {
    compute_backoff_with(
        &mut rand::thread_rng(),
        num_attempts,
        initial_delay_ms,
        max_delay_ms,
    )
}

/// Same as [`compute_backoff`] with an explicit random source.
pub fn compute_backoff_with<R: Rng>(
    rng: &mut R,
    num_attempts: u32,
    initial_delay_ms: u64,
    max_delay_ms: u64,
) -> u64 {
    let ceiling = backoff_ceiling(num_attempts, initial_delay_ms, max_delay_ms);
    if ceiling == 0 {
        return 0;
    }
    rng.gen_range(0..=ceiling)
}

/// `min(max, initial * 2^n)`, clamped to `max` when the product overflows.
pub(crate) fn backoff_ceiling(num_attempts: u32, initial_delay_ms: u64, max_delay_ms: u64) -> u64 {
    let raw = 1u64
        .checked_shl(num_attempts)
        .and_then(|multiplier| initial_delay_ms.checked_mul(multiplier));
    match raw {
        Some(raw) => raw.min(max_delay_ms),
        None => max_delay_ms,
    }
}
