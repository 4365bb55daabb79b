// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use super::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn delay_doubles_with_each_attempt_before_hitting_the_cap() {
    let mut rng = StdRng::seed_from_u64(1);
    let recheck = Duration::from_millis(5000);
    let max_defer = Duration::from_millis(60_000);

    let d1 = next_retry_delay(&mut rng, 1, recheck, max_defer).as_millis();
    let d2 = next_retry_delay(&mut rng, 2, recheck, max_defer).as_millis();
    assert!((4000..=6000).contains(&d1), "d1={d1}");
    assert!((8000..=12000).contains(&d2), "d2={d2}");
}

#[test]
fn delay_never_exceeds_max_defer() {
    let mut rng = StdRng::seed_from_u64(2);
    let recheck = Duration::from_millis(5000);
    let max_defer = Duration::from_millis(60_000);

    let d = next_retry_delay(&mut rng, 10, recheck, max_defer).as_millis();
    assert!(d <= 72_000, "d={d}");
}

#[test]
fn retry_after_hint_overrides_computed_backoff() {
    let mut rng = StdRng::seed_from_u64(3);
    let recheck = Duration::from_millis(5000);
    let max_defer = Duration::from_millis(60_000);

    let d = retry_delay_with_hint(&mut rng, 5, recheck, max_defer, Some(Duration::from_millis(2000)));
    assert_eq!(d, Duration::from_millis(2000));
}
