// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with a cap and ±20% jitter, per SPEC_FULL.md §4.6
/// step 4: `min(max_defer, recheck * 2^(attempts-1))`, jittered.
pub fn next_retry_delay<R: Rng + ?Sized>(rng: &mut R, attempts: u32, recheck: Duration, max_defer: Duration) -> Duration {
    let exponent = attempts.saturating_sub(1).min(20);
    let scaled = recheck.as_millis().saturating_mul(1u128 << exponent);
    let capped_ms = scaled.min(max_defer.as_millis()) as u64;

    let jitter_fraction = rng.gen_range(-0.2..=0.2);
    let jittered = (capped_ms as f64) * (1.0 + jitter_fraction);
    Duration::from_millis(jittered.max(0.0).round() as u64)
}

/// A `Retry-After` hint, when the bridge collaborator supplied one, takes
/// priority over the computed backoff (SPEC_FULL.md §4.6 step 4).
pub fn retry_delay_with_hint<R: Rng + ?Sized>(
    rng: &mut R,
    attempts: u32,
    recheck: Duration,
    max_defer: Duration,
    retry_after: Option<Duration>,
) -> Duration {
    retry_after.unwrap_or_else(|| next_retry_delay(rng, attempts, recheck, max_defer))
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
