//! Port interfaces for credential storage and the OAuth provider

use async_trait::async_trait;
use socialpub_domain::{Credential, PlatformError, PlatformIdentity, Result, TokenGrant};

/// Persisted credential records, one per subject
///
/// Writes replace the whole record; implementations never merge fields.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the credential for `subject_id`, if any
    async fn get(&self, subject_id: &str) -> Result<Option<Credential>>;

    /// Insert or replace the credential for `credential.subject_id`
    async fn put(&self, credential: &Credential) -> Result<()>;

    /// Remove the credential; returns whether one existed
    async fn delete(&self, subject_id: &str) -> Result<bool>;
}

/// OAuth token endpoint and identity lookup
#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// Exchange a refresh token for a new grant
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> std::result::Result<TokenGrant, PlatformError>;

    /// Exchange an authorization code from the redirect callback
    async fn exchange_code(&self, code: &str) -> std::result::Result<TokenGrant, PlatformError>;

    /// Resolve the platform identity behind an access token
    async fn fetch_identity(
        &self,
        access_token: &str,
    ) -> std::result::Result<PlatformIdentity, PlatformError>;
}
