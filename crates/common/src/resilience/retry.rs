//! Retry decision policy for outbound HTTP calls
//!
//! The policy is a pure function of the attempt number and the observed
//! outcome: it never sleeps, never performs I/O and holds no mutable state.
//! Executors (such as the infrastructure HTTP client) feed every attempt
//! outcome into [`RetryPolicy::decide`] and act on the returned
//! [`RetryDecision`].
//!
//! Delays follow exponential backoff
//! `min(max_delay, base_delay * 2^(attempt - 1))` with optional proportional
//! jitter, clamped to `max_delay` after jitter is applied.

use std::collections::BTreeSet;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

/// Status codes retried by default.
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(200);

/// Default upper bound for any single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Default jitter factor (±50%).
pub const DEFAULT_JITTER_FACTOR: f64 = 0.5;

/// Class of failure that prevented an HTTP response from being received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// Connection could not be established
    Connect,
    /// The attempt exceeded its timeout
    Timeout,
    /// Any other failure while sending or receiving
    Other,
}

/// Observed result of a single attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// No response was received
    Transport(TransportFailure),
    /// A response was received with the given status code
    Status {
        /// HTTP status code
        code: u16,
        /// Server-provided `Retry-After` hint, if any
        retry_after: Option<Duration>,
    },
}

impl AttemptOutcome {
    /// Outcome for a response without a `Retry-After` hint.
    #[must_use]
    pub const fn status(code: u16) -> Self {
        Self::Status { code, retry_after: None }
    }

    /// Whether the outcome represents a successful (2xx) response.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Status { code, .. } if *code >= 200 && *code < 300)
    }
}

/// Decision returned by [`RetryPolicy::decide`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation after waiting for the given delay
    RetryAfter(Duration),
    /// Do not retry; the outcome is terminal
    Stop,
}

impl RetryDecision {
    /// `true` when the caller should issue another attempt.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        matches!(self, Self::RetryAfter(_))
    }

    /// Delay to wait before the next attempt, if retrying.
    #[must_use]
    pub const fn delay(&self) -> Option<Duration> {
        match self {
            Self::RetryAfter(delay) => Some(*delay),
            Self::Stop => None,
        }
    }
}

/// Jitter applied to computed backoff delays
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Jitter {
    /// Use the computed delay unchanged
    None,
    /// Scale the delay by a random factor in `[1 - f, 1 + f]`
    Proportional(f64),
}

impl Jitter {
    /// Apply jitter to `delay`.
    #[must_use]
    pub fn apply(&self, delay: Duration) -> Duration {
        match *self {
            Self::None => delay,
            Self::Proportional(factor) => {
                let factor = factor.clamp(0.0, 1.0);
                if factor == 0.0 || delay.is_zero() {
                    return delay;
                }
                let scale = rand::thread_rng().gen_range((1.0 - factor)..=(1.0 + factor));
                delay.mul_f64(scale)
            }
        }
    }
}

/// Errors raised while building a [`RetryPolicy`]
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RetryConfigError {
    /// The supplied configuration is inconsistent
    #[error("Invalid retry configuration: {message}")]
    InvalidConfiguration {
        /// Human-readable description of the problem
        message: String,
    },
}

/// Retry policy for outbound HTTP calls
///
/// Retries only when `attempt <= max_retries` and the outcome is either a
/// transport failure or a status code in the retryable set. Authentication
/// failures (401) are never retried here; token refresh is handled by the
/// caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: Jitter,
    retryable_statuses: BTreeSet<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: Jitter::Proportional(DEFAULT_JITTER_FACTOR),
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    /// Create a builder seeded with the default policy.
    #[must_use]
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    /// Decide whether attempt number `attempt` (1-based) should be retried.
    #[must_use]
    pub fn decide(&self, attempt: u32, outcome: &AttemptOutcome) -> RetryDecision {
        let attempt = attempt.max(1);
        if attempt > self.max_retries || !self.is_retryable(outcome) {
            return RetryDecision::Stop;
        }

        let delay = match outcome {
            AttemptOutcome::Status { retry_after: Some(hint), .. } => (*hint).min(self.max_delay),
            _ => self.jitter.apply(self.backoff_delay(attempt)).min(self.max_delay),
        };

        RetryDecision::RetryAfter(delay)
    }

    /// Whether the outcome is transient under this policy.
    #[must_use]
    pub fn is_retryable(&self, outcome: &AttemptOutcome) -> bool {
        match outcome {
            AttemptOutcome::Transport(_) => true,
            AttemptOutcome::Status { code, .. } => self.retryable_statuses.contains(code),
        }
    }

    /// Un-jittered backoff for the given attempt: non-decreasing in
    /// `attempt` and never above `max_delay`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.max(1).saturating_sub(1).min(31);
        let multiplier = 1u32 << shift;
        self.base_delay.saturating_mul(multiplier).min(self.max_delay)
    }

    /// Maximum number of retries after the first attempt.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Upper bound on any single delay.
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Base delay used for the first retry.
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Configured jitter.
    #[must_use]
    pub const fn jitter(&self) -> Jitter {
        self.jitter
    }

    /// Status codes treated as transient.
    #[must_use]
    pub const fn retryable_statuses(&self) -> &BTreeSet<u16> {
        &self.retryable_statuses
    }
}

/// Builder for [`RetryPolicy`] with validation
#[derive(Debug, Clone, Default)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Number of retries after the initial attempt.
    #[must_use]
    pub const fn max_retries(mut self, retries: u32) -> Self {
        self.policy.max_retries = retries;
        self
    }

    /// Delay before the first retry.
    #[must_use]
    pub const fn base_delay(mut self, delay: Duration) -> Self {
        self.policy.base_delay = delay;
        self
    }

    /// Upper bound on any single delay.
    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    /// Disable jitter.
    #[must_use]
    pub const fn no_jitter(mut self) -> Self {
        self.policy.jitter = Jitter::None;
        self
    }

    /// Proportional jitter of `±factor`.
    #[must_use]
    pub const fn proportional_jitter(mut self, factor: f64) -> Self {
        self.policy.jitter = Jitter::Proportional(factor);
        self
    }

    /// Replace the retryable status set.
    #[must_use]
    pub fn retryable_statuses<I>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = u16>,
    {
        self.policy.retryable_statuses = statuses.into_iter().collect();
        self
    }

    /// Validate and build the policy.
    ///
    /// # Errors
    /// Returns [`RetryConfigError::InvalidConfiguration`] when the maximum
    /// delay is below the base delay, the jitter factor lies outside
    /// `[0, 1]`, or a retryable status is not a valid HTTP status code.
    pub fn build(self) -> Result<RetryPolicy, RetryConfigError> {
        let policy = self.policy;

        if policy.max_delay < policy.base_delay {
            return Err(RetryConfigError::InvalidConfiguration {
                message: format!(
                    "max_delay ({:?}) must not be below base_delay ({:?})",
                    policy.max_delay, policy.base_delay
                ),
            });
        }

        if let Jitter::Proportional(factor) = policy.jitter {
            if !(0.0..=1.0).contains(&factor) {
                return Err(RetryConfigError::InvalidConfiguration {
                    message: format!("jitter factor must be within [0, 1], got {factor}"),
                });
            }
        }

        if let Some(code) = policy.retryable_statuses.iter().find(|c| !(100..=599).contains(*c)) {
            return Err(RetryConfigError::InvalidConfiguration {
                message: format!("retryable status {code} is not a valid HTTP status"),
            });
        }

        Ok(policy)
    }
}
