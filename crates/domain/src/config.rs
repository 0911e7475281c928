//! Configuration structures
//!
//! Every field carries a serde default so partial configuration files are
//! accepted; [`Config::validate`] rejects values that cannot work.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_REFRESH_MARGIN_SECS;
use crate::errors::{Result, SocialPubError};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub platform: PlatformConfig,
    pub http: HttpConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub publish: PublishConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `SocialPubError::Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.platform.api_base_url.trim().is_empty() {
            return Err(SocialPubError::Config("platform.api_base_url must be set".into()));
        }
        if self.platform.oauth_base_url.trim().is_empty() {
            return Err(SocialPubError::Config("platform.oauth_base_url must be set".into()));
        }
        if self.http.attempt_timeout_ms == 0 {
            return Err(SocialPubError::Config("http.attempt_timeout_ms must be positive".into()));
        }
        if self.http.max_delay_ms < self.http.base_delay_ms {
            return Err(SocialPubError::Config(
                "http.max_delay_ms must not be below http.base_delay_ms".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.http.jitter_factor) {
            return Err(SocialPubError::Config("http.jitter_factor must be within [0, 1]".into()));
        }
        if self.auth.refresh_margin_secs < 0 {
            return Err(SocialPubError::Config("auth.refresh_margin_secs must be >= 0".into()));
        }
        if self.media.poll_interval_ms == 0 {
            return Err(SocialPubError::Config("media.poll_interval_ms must be positive".into()));
        }
        if self.media.poll_deadline_secs == 0 {
            return Err(SocialPubError::Config("media.poll_deadline_secs must be positive".into()));
        }
        if self.media.max_concurrent_uploads == 0 {
            return Err(SocialPubError::Config(
                "media.max_concurrent_uploads must be positive".into(),
            ));
        }
        if self.database.pool_size == 0 {
            return Err(SocialPubError::Config("database.pool_size must be positive".into()));
        }
        Ok(())
    }
}

/// External platform endpoints and OAuth client registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub api_base_url: String,
    pub oauth_base_url: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.linkedin.com".to_string(),
            oauth_base_url: "https://www.linkedin.com".to_string(),
            client_id: String::new(),
            client_secret: None,
            redirect_uri: "http://localhost:8888/callback".to_string(),
            scopes: vec!["openid".to_string(), "profile".to_string(), "w_member_social".to_string()],
        }
    }
}

/// Outbound HTTP behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub attempt_timeout_ms: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
    pub retryable_statuses: Vec<u16>,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_ms: 30_000,
            max_retries: 3,
            base_delay_ms: 200,
            max_delay_ms: 10_000,
            jitter_factor: 0.5,
            retryable_statuses: vec![408, 429, 500, 502, 503, 504],
            user_agent: concat!("socialpub/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub const fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Token lifecycle settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Refresh when fewer than this many seconds of validity remain
    pub refresh_margin_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { refresh_margin_secs: DEFAULT_REFRESH_MARGIN_SECS }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn refresh_margin(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.refresh_margin_secs)
    }
}

/// Media preparation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub poll_interval_ms: u64,
    pub poll_deadline_secs: u64,
    pub max_concurrent_uploads: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self { poll_interval_ms: 2_000, poll_deadline_secs: 120, max_concurrent_uploads: 3 }
    }
}

impl MediaConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn poll_deadline(&self) -> Duration {
        Duration::from_secs(self.poll_deadline_secs)
    }
}

/// Publish operation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Overall deadline for one publish; `0` disables it
    pub deadline_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self { deadline_secs: 300 }
    }
}

impl PublishConfig {
    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        if self.deadline_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.deadline_secs))
        }
    }
}

/// SQLite persistence settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "socialpub.db".to_string(), pool_size: 4 }
    }
}

/// Logging output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
