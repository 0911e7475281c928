//! Token manager with serialized per-subject refresh
//!
//! Manages the OAuth credential lifecycle for every subject:
//! - Cheap validity check before each outbound request
//! - Refresh through the OAuth provider when inside the safety margin
//! - At most one refresh exchange per subject at a time
//! - Connect and disconnect flows
//!
//! Check-then-refresh runs under a [`KeyedLock`] scoped to the subject, so a
//! caller that arrives while a refresh is in flight waits for it and then
//! reads the rotated credential instead of spending the refresh token again.

use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use socialpub_common::sync::KeyedLock;
use socialpub_common::time::{Clock, SystemClock};
use socialpub_domain::{AuthError, ConnectionStatus, Credential, PlatformError};
use tracing::{debug, info, instrument, warn};

use super::ports::{OAuthClient, TokenStore};

/// Failure of a platform call made through [`TokenManager::with_reauth`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizedCallError {
    /// No usable credential could be obtained
    Auth(AuthError),
    /// The call itself failed
    Platform(PlatformError),
}

/// Obtains currently valid credentials, refreshing them when needed
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    oauth: Arc<dyn OAuthClient>,
    clock: Arc<dyn Clock>,
    refresh_margin: Duration,
    locks: KeyedLock,
}

impl TokenManager {
    /// Create a token manager
    ///
    /// # Arguments
    /// * `store` - credential persistence
    /// * `oauth` - token endpoint client
    /// * `refresh_margin` - refresh when less validity than this remains
    pub fn new(
        store: Arc<dyn TokenStore>,
        oauth: Arc<dyn OAuthClient>,
        refresh_margin: Duration,
    ) -> Self {
        Self { store, oauth, clock: Arc::new(SystemClock), refresh_margin, locks: KeyedLock::new() }
    }

    /// Replace the wall clock used for expiry checks.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub const fn refresh_margin(&self) -> Duration {
        self.refresh_margin
    }

    /// Return a credential that stays valid beyond the safety margin.
    ///
    /// The fast path reads the store without locking and makes no network
    /// call. Otherwise the subject's lock is taken, the record is read again
    /// and refreshed only if no concurrent caller already did so.
    ///
    /// # Errors
    /// - `NotConnected` if no credential is stored
    /// - `ReauthorizationRequired` if the credential expired and cannot be
    ///   refreshed, or the provider rejected the refresh token
    /// - `RefreshUnavailable` if the provider could not be reached
    /// - `Storage` if the token store failed
    #[instrument(skip(self))]
    pub async fn get_valid_token(&self, subject_id: &str) -> Result<Credential, AuthError> {
        let current = self.load(subject_id).await?;
        if current.is_valid_at(self.clock.now(), self.refresh_margin) {
            return Ok(current);
        }

        let _guard = self.locks.lock(subject_id).await;

        let current = self.load(subject_id).await?;
        if current.is_valid_at(self.clock.now(), self.refresh_margin) {
            debug!("credential refreshed by a concurrent caller");
            return Ok(current);
        }

        self.refresh_locked(current, false).await
    }

    /// Recover from the platform rejecting `rejected_access_token` with 401.
    ///
    /// If the stored access token already differs from the rejected one, a
    /// concurrent caller has rotated it and the stored credential is returned
    /// without a network call. Otherwise a refresh is forced regardless of
    /// the recorded expiry.
    ///
    /// # Errors
    /// Same as [`TokenManager::get_valid_token`].
    #[instrument(skip(self, rejected_access_token))]
    pub async fn refresh_after_rejection(
        &self,
        subject_id: &str,
        rejected_access_token: &str,
    ) -> Result<Credential, AuthError> {
        let _guard = self.locks.lock(subject_id).await;

        let current = self.load(subject_id).await?;
        if current.access_token != rejected_access_token {
            if current.is_valid_at(self.clock.now(), self.refresh_margin) {
                debug!("rejected token already rotated");
                return Ok(current);
            }
            return self.refresh_locked(current, false).await;
        }

        self.refresh_locked(current, true).await
    }

    /// Run a bearer-authenticated call, recovering from one 401.
    ///
    /// `call` receives the access token. If the platform rejects it, the
    /// token is refreshed through [`TokenManager::refresh_after_rejection`]
    /// and the call is repeated exactly once with the new token. A second
    /// rejection is returned to the caller.
    ///
    /// # Errors
    /// `Auth` if no credential could be obtained, `Platform` if the call
    /// failed.
    pub async fn with_reauth<T, F, Fut>(
        &self,
        subject_id: &str,
        call: F,
    ) -> Result<T, AuthorizedCallError>
    where
        F: Fn(String) -> Fut + Send,
        Fut: Future<Output = Result<T, PlatformError>> + Send,
        T: Send,
    {
        let credential =
            self.get_valid_token(subject_id).await.map_err(AuthorizedCallError::Auth)?;

        match call(credential.access_token.clone()).await {
            Err(err) if err.is_unauthorized() => {
                warn!(subject_id, error = %err, "access token rejected, refreshing once");
                let fresh = self
                    .refresh_after_rejection(subject_id, &credential.access_token)
                    .await
                    .map_err(AuthorizedCallError::Auth)?;
                call(fresh.access_token).await.map_err(AuthorizedCallError::Platform)
            }
            result => result.map_err(AuthorizedCallError::Platform),
        }
    }

    /// Thin read of the stored credential; never refreshes.
    ///
    /// # Errors
    /// Returns `Storage` if the token store failed.
    pub async fn connection_status(&self, subject_id: &str) -> Result<ConnectionStatus, AuthError> {
        let status = match self.store.get(subject_id).await? {
            Some(credential) => ConnectionStatus::from_credential(&credential, self.clock.now()),
            None => ConnectionStatus::disconnected(),
        };
        Ok(status)
    }

    /// Complete the authorization flow for a subject.
    ///
    /// Exchanges the authorization code, resolves the member identity and
    /// stores a new credential, replacing any previous record.
    ///
    /// # Errors
    /// - `ReauthorizationRequired` if the provider rejected the code
    /// - `RefreshUnavailable` if the provider could not be reached
    /// - `Storage` if the token store failed
    #[instrument(skip(self, code))]
    pub async fn connect(&self, subject_id: &str, code: &str) -> Result<ConnectionStatus, AuthError> {
        let _guard = self.locks.lock(subject_id).await;

        let grant = self
            .oauth
            .exchange_code(code)
            .await
            .map_err(|err| classify_provider_error(subject_id, err))?;
        let identity = self
            .oauth
            .fetch_identity(&grant.access_token)
            .await
            .map_err(|err| classify_provider_error(subject_id, err))?;

        let now = self.clock.now();
        let mut credential = Credential::from_grant(subject_id, grant, None, now);
        credential.external_urn = Some(identity.urn());
        self.store.put(&credential).await?;

        info!(external_urn = %identity.urn(), "account connected");
        Ok(ConnectionStatus::from_credential(&credential, now))
    }

    /// Forget the subject's credential.
    ///
    /// # Errors
    /// Returns `Storage` if the token store failed.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, subject_id: &str) -> Result<bool, AuthError> {
        let _guard = self.locks.lock(subject_id).await;
        let removed = self.store.delete(subject_id).await?;
        info!(removed, "account disconnected");
        Ok(removed)
    }

    async fn load(&self, subject_id: &str) -> Result<Credential, AuthError> {
        self.store
            .get(subject_id)
            .await?
            .ok_or_else(|| AuthError::NotConnected { subject_id: subject_id.to_string() })
    }

    /// Refresh while the subject's lock is held.
    ///
    /// `rejected` marks the current access token as unusable even if its
    /// recorded expiry lies in the future.
    async fn refresh_locked(
        &self,
        current: Credential,
        rejected: bool,
    ) -> Result<Credential, AuthError> {
        let subject_id = current.subject_id.clone();
        let now = self.clock.now();
        let usable = !rejected && !current.is_expired_at(now);

        let Some(refresh_token) = current.refresh_token.clone().filter(|t| !t.is_empty()) else {
            if usable {
                warn!(
                    seconds_left = current.seconds_until_expiry(now),
                    "credential inside refresh margin has no refresh token"
                );
                return Ok(current);
            }
            return Err(AuthError::ReauthorizationRequired {
                subject_id,
                reason: "credential expired and has no refresh token".to_string(),
            });
        };

        let grant = match self.oauth.refresh_access_token(&refresh_token).await {
            Ok(grant) => grant,
            Err(err) => {
                let classified = classify_provider_error(&subject_id, err);
                if usable && matches!(classified, AuthError::RefreshUnavailable { .. }) {
                    warn!(error = %classified, "refresh unavailable, using current token");
                    return Ok(current);
                }
                warn!(error = %classified, "token refresh failed");
                return Err(classified);
            }
        };

        let refreshed = Credential::from_grant(&subject_id, grant, Some(&current), self.clock.now());
        self.store.put(&refreshed).await?;

        info!(expires_at = %refreshed.expires_at, "access token refreshed");
        Ok(refreshed)
    }
}

/// Rejections mean the grant is dead; anything else is an outage.
fn classify_provider_error(subject_id: &str, err: PlatformError) -> AuthError {
    match err {
        PlatformError::Unauthorized(reason) => {
            AuthError::ReauthorizationRequired { subject_id: subject_id.to_string(), reason }
        }
        PlatformError::Rejected { status, message } if !is_transient_status(status) => {
            AuthError::ReauthorizationRequired {
                subject_id: subject_id.to_string(),
                reason: format!("HTTP {status}: {message}"),
            }
        }
        cause => AuthError::RefreshUnavailable { subject_id: subject_id.to_string(), cause },
    }
}

const fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}
