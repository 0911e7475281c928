//! LinkedIn integration for account connection, media upload and posting
//!
//! # Architecture
//!
//! - **OAuth**: [`LinkedInOAuthClient`] implements the core `OAuthClient`
//!   port (code exchange, refresh, `userinfo`)
//! - **Client**: [`LinkedInClient`] implements `MediaApi` and `PostApi`
//!   against the v2 REST endpoints
//! - **Types**: serde wire structs, private to this module
//!
//! Both clients share one [`HttpClient`](crate::http::HttpClient) so the
//! retry policy and attempt timeout are configured once. Uploads to the
//! platform-supplied URL are sent exactly once; every other call goes
//! through the retrying path.

use reqwest::Response;
use socialpub_domain::{PlatformConfig, PlatformError, SocialPubError};
use url::Url;

use crate::errors::platform_error_for_status;

pub mod client;
pub mod oauth;
pub(crate) mod types;

pub use client::LinkedInClient;
pub use oauth::LinkedInOAuthClient;

use types::{ApiErrorBody, OAuthErrorBody};

/// Header required by the Rest.li v2 endpoints.
pub const RESTLI_PROTOCOL_HEADER: &str = "X-Restli-Protocol-Version";
pub const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";
/// Header carrying the created entity id.
pub const RESTLI_ID_HEADER: &str = "x-restli-id";
pub const IDEMPOTENCY_HEADER: &str = "X-Idempotency-Key";

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Base URLs and client registration shared by both clients
#[derive(Debug, Clone)]
pub struct LinkedInEndpoints {
    api_base: Url,
    oauth_base: Url,
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
    scopes: Vec<String>,
}

impl LinkedInEndpoints {
    /// # Errors
    /// Returns `SocialPubError::Config` if a base URL does not parse.
    pub fn from_config(config: &PlatformConfig) -> Result<Self, SocialPubError> {
        Ok(Self {
            api_base: parse_base(&config.api_base_url, "platform.api_base_url")?,
            oauth_base: parse_base(&config.oauth_base_url, "platform.oauth_base_url")?,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
        })
    }

    pub(crate) fn api(&self, path: &str) -> String {
        join(&self.api_base, path)
    }

    pub(crate) fn oauth(&self, path: &str) -> String {
        join(&self.oauth_base, path)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

fn parse_base(raw: &str, field: &str) -> Result<Url, SocialPubError> {
    Url::parse(raw.trim()).map_err(|err| SocialPubError::Config(format!("invalid {field}: {err}")))
}

fn join(base: &Url, path: &str) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Turn a terminal non-2xx response into a classified error.
///
/// The platform's own message is preferred over the raw body so callers can
/// surface it verbatim.
pub(crate) async fn error_from_response(response: Response) -> PlatformError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    platform_error_for_status(status, extract_message(status, &body))
}

fn extract_message(status: u16, body: &str) -> String {
    if let Ok(api) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = api.message.filter(|m| !m.is_empty()) {
            return match api.service_error_code {
                Some(code) => format!("{message} (service error {code})"),
                None => message,
            };
        }
    }
    if let Ok(oauth) = serde_json::from_str::<OAuthErrorBody>(body) {
        match (oauth.error, oauth.error_description) {
            (Some(error), Some(description)) => return format!("{error}: {description}"),
            (Some(error), None) => return error,
            (None, Some(description)) => return description,
            (None, None) => {}
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {status}");
    }
    trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
