//! Integration tests for the retry decision policy
//!
//! Exercises the policy across the full attempt range and status space the
//! HTTP client feeds it.

#![cfg(feature = "foundation")]

use std::time::Duration;

use socialpub_common::resilience::{
    AttemptOutcome, RetryDecision, RetryPolicy, TransportFailure, DEFAULT_RETRYABLE_STATUSES,
};

fn policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::builder()
        .max_retries(max_retries)
        .base_delay(Duration::from_millis(25))
        .max_delay(Duration::from_millis(700))
        .no_jitter()
        .build()
        .expect("valid policy")
}

/// Delays for retryable outcomes never shrink as the attempt number grows
/// and never exceed the configured maximum.
///
/// # Test Steps
/// 1. Walk every attempt from 1 to the configured maximum
/// 2. Decide for every default retryable status and a transport failure
/// 3. Verify each decision retries with a non-decreasing, bounded delay
#[test]
fn test_retryable_delays_are_monotonic_and_bounded() {
    let max_retries = 12;
    let policy = policy(max_retries);

    let mut outcomes: Vec<AttemptOutcome> =
        DEFAULT_RETRYABLE_STATUSES.iter().map(|code| AttemptOutcome::status(*code)).collect();
    outcomes.push(AttemptOutcome::Transport(TransportFailure::Timeout));

    for outcome in outcomes {
        let mut previous = Duration::ZERO;
        for attempt in 1..=max_retries {
            let decision = policy.decide(attempt, &outcome);
            let delay = decision.delay().expect("retryable outcome within budget must retry");
            assert!(delay >= previous, "delay decreased at attempt {attempt} for {outcome:?}");
            assert!(delay <= policy.max_delay());
            previous = delay;
        }
        assert_eq!(policy.decide(max_retries + 1, &outcome), RetryDecision::Stop);
    }
}

/// Every status outside the retryable set stops on the very first attempt.
#[test]
fn test_non_retryable_statuses_stop_on_first_attempt() {
    let policy = policy(5);

    for code in 100u16..600 {
        if DEFAULT_RETRYABLE_STATUSES.contains(&code) {
            continue;
        }
        assert_eq!(
            policy.decide(1, &AttemptOutcome::status(code)),
            RetryDecision::Stop,
            "status {code} must not be retried"
        );
    }
}

/// The default policy carries the documented retryable status set and
/// jitters within ±50% of the computed backoff.
#[test]
fn test_default_policy_shape() {
    let policy = RetryPolicy::default();

    let statuses: Vec<u16> = policy.retryable_statuses().iter().copied().collect();
    assert_eq!(statuses, vec![408, 429, 500, 502, 503, 504]);

    for attempt in 1..=policy.max_retries() {
        let base = policy.backoff_delay(attempt);
        let delay = policy.decide(attempt, &AttemptOutcome::status(502)).delay().unwrap();
        assert!(delay >= base.mul_f64(0.5));
        assert!(delay <= base.mul_f64(1.5).min(policy.max_delay()));
    }
}
