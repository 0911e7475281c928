use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use socialpub_common::resilience::{AttemptOutcome, RetryDecision, RetryPolicy, TransportFailure};
use socialpub_domain::{HttpConfig, PlatformError, SocialPubError};
use tracing::{debug, warn};

use crate::errors::{transport_error, InfraError};

/// HTTP client with an injected retry policy and a per-attempt timeout.
///
/// The client never mutates request bodies or adds credentials; callers pass
/// fully formed requests. A terminal response, successful or not, is
/// returned as `Ok`. `Err` means no response arrived.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    policy: RetryPolicy,
    attempt_timeout: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Build a client from the `[http]` configuration section.
    ///
    /// # Errors
    /// Returns `SocialPubError::Config` for an invalid retry policy or TLS
    /// backend failure.
    pub fn from_config(config: &HttpConfig) -> Result<Self, SocialPubError> {
        let policy = RetryPolicy::builder()
            .max_retries(config.max_retries)
            .base_delay(config.base_delay())
            .max_delay(config.max_delay())
            .proportional_jitter(config.jitter_factor)
            .retryable_statuses(config.retryable_statuses.iter().copied())
            .build()
            .map_err(|err| SocialPubError::Config(err.to_string()))?;

        Self::builder()
            .policy(policy)
            .attempt_timeout(config.attempt_timeout())
            .user_agent(config.user_agent.clone())
            .build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute the request, retrying transient outcomes per the policy.
    ///
    /// Only use this for requests that are safe to repeat.
    ///
    /// # Errors
    /// `PlatformError::Transport` once retries are exhausted without a
    /// response, or `PlatformError::Config` if the request cannot be built.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, PlatformError> {
        self.send_with_policy(builder, &self.policy).await
    }

    /// Execute the request exactly once, still bounded by the attempt timeout.
    ///
    /// # Errors
    /// Same as [`HttpClient::send`].
    pub async fn send_once(&self, builder: RequestBuilder) -> Result<Response, PlatformError> {
        self.send_with_policy(builder, &RetryPolicy::no_retry()).await
    }

    async fn send_with_policy(
        &self,
        builder: RequestBuilder,
        policy: &RetryPolicy,
    ) -> Result<Response, PlatformError> {
        let mut attempt: u32 = 1;

        loop {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                PlatformError::Config(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;
            let request = cloned_builder.build().map_err(|err| transport_error(&err))?;

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt, %method, %url, "sending HTTP request");

            let (result, outcome) =
                match tokio::time::timeout(self.attempt_timeout, self.client.execute(request))
                    .await
                {
                    Ok(Ok(response)) => {
                        let code = response.status().as_u16();
                        let retry_after = parse_retry_after(response.headers(), Utc::now());
                        debug!(attempt, %method, %url, status = code, "received HTTP response");
                        (Ok(response), AttemptOutcome::Status { code, retry_after })
                    }
                    Ok(Err(err)) => {
                        debug!(attempt, %method, %url, error = %err, "HTTP request failed");
                        if err.is_builder() {
                            return Err(transport_error(&err));
                        }
                        let failure = classify_failure(&err);
                        (Err(transport_error(&err)), AttemptOutcome::Transport(failure))
                    }
                    Err(_) => {
                        debug!(attempt, %method, %url, "HTTP attempt timed out");
                        let err = PlatformError::Transport {
                            message: format!(
                                "HTTP attempt timed out after {} ms",
                                self.attempt_timeout.as_millis()
                            ),
                            timed_out: true,
                        };
                        (Err(err), AttemptOutcome::Transport(TransportFailure::Timeout))
                    }
                };

            match policy.decide(attempt, &outcome) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(attempt, %method, %url, ?outcome, delay_ms = delay.as_millis(), "retrying HTTP request");
                    drop(result);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                RetryDecision::Stop => return result,
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    attempt_timeout: Duration,
    policy: RetryPolicy,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(30),
            policy: RetryPolicy::default(),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    /// Bound each individual attempt, including reading response headers.
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// # Errors
    /// Returns `SocialPubError::Network` if the TLS backend cannot start.
    pub fn build(self) -> Result<HttpClient, SocialPubError> {
        let mut builder = ReqwestClient::builder().no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| SocialPubError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, policy: self.policy, attempt_timeout: self.attempt_timeout })
    }
}

fn classify_failure(err: &reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        TransportFailure::Timeout
    } else if err.is_connect() {
        TransportFailure::Connect
    } else {
        TransportFailure::Other
    }
}

/// Parse a `Retry-After` header given as delta-seconds or an HTTP date.
pub(crate) fn parse_retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}
