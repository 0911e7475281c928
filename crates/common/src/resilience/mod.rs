//! Resilience patterns for outbound calls
//!
//! This module provides the retry decision policy shared by every component
//! that talks to the external platform. The policy is a pure value object:
//! executors inject it and consult it after each attempt, so the retry rules
//! live in exactly one place.

pub mod retry;

pub use retry::{
    AttemptOutcome, Jitter, RetryConfigError, RetryDecision, RetryPolicy, RetryPolicyBuilder,
    TransportFailure, DEFAULT_BASE_DELAY, DEFAULT_JITTER_FACTOR, DEFAULT_MAX_DELAY,
    DEFAULT_MAX_RETRIES, DEFAULT_RETRYABLE_STATUSES,
};
