//! OAuth credential types
//!
//! One [`Credential`] is stored per subject. It is replaced as a whole
//! record after every successful authorization or refresh.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_TOKEN_LIFETIME_SECS, PERSON_URN_PREFIX};

/// Stored OAuth access/refresh token pair for one subject
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub subject_id: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub granted_scopes: BTreeSet<String>,
    /// Platform identity of the subject, e.g. `urn:li:person:abc123`
    pub external_urn: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("subject_id", &self.subject_id)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .field("granted_scopes", &self.granted_scopes)
            .field("external_urn", &self.external_urn)
            .finish_non_exhaustive()
    }
}

impl Credential {
    /// Whether the access token stays valid for longer than `margin` after
    /// `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin < self.expires_at
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether a refresh exchange is possible at all.
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|token| !token.is_empty())
    }

    /// Seconds left before expiry; negative once expired.
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds()
    }

    /// Build the credential that results from a token grant.
    ///
    /// Providers may omit the refresh token or scope on refresh; in that case
    /// the values from `previous` carry over. The external URN and creation
    /// time are also preserved. The granted lifetime is clamped to
    /// `0..=MAX_TOKEN_LIFETIME_SECS`.
    #[must_use]
    pub fn from_grant(
        subject_id: &str,
        grant: TokenGrant,
        previous: Option<&Self>,
        now: DateTime<Utc>,
    ) -> Self {
        let refresh_token = grant
            .refresh_token
            .filter(|token| !token.is_empty())
            .or_else(|| previous.and_then(|p| p.refresh_token.clone()));

        let granted_scopes = match grant.scope.as_deref() {
            Some(scope) if !scope.trim().is_empty() => parse_scopes(scope),
            _ => previous.map(|p| p.granted_scopes.clone()).unwrap_or_default(),
        };

        let lifetime = grant.expires_in_secs.clamp(0, MAX_TOKEN_LIFETIME_SECS);
        let expires_at =
            Duration::try_seconds(lifetime).and_then(|d| now.checked_add_signed(d)).unwrap_or(now);

        Self {
            subject_id: subject_id.to_string(),
            access_token: grant.access_token,
            refresh_token,
            expires_at,
            granted_scopes,
            external_urn: previous.and_then(|p| p.external_urn.clone()),
            created_at: previous.map_or(now, |p| p.created_at),
            updated_at: now,
        }
    }

    /// Bearer header value for this credential.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Split a provider scope string on spaces or commas.
#[must_use]
pub fn parse_scopes(raw: &str) -> BTreeSet<String> {
    raw.split(|c: char| c == ' ' || c == ',')
        .map(str::trim)
        .filter(|scope| !scope.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Result of an OAuth token exchange
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in_secs: i64,
    pub scope: Option<String>,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in_secs", &self.expires_in_secs)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Identity returned by the platform's user-info endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformIdentity {
    /// Stable member identifier (`sub` claim)
    pub member_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl PlatformIdentity {
    /// Author URN used when creating posts.
    #[must_use]
    pub fn urn(&self) -> String {
        format!("{PERSON_URN_PREFIX}{}", self.member_id)
    }
}

/// Connection summary returned to the UI layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub is_connected: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub external_urn: Option<String>,
}

impl ConnectionStatus {
    #[must_use]
    pub const fn disconnected() -> Self {
        Self { is_connected: false, expires_at: None, external_urn: None }
    }

    /// Summarize a stored credential without refreshing it.
    ///
    /// An expired credential still counts as connected while it can be
    /// refreshed.
    #[must_use]
    pub fn from_credential(credential: &Credential, now: DateTime<Utc>) -> Self {
        Self {
            is_connected: !credential.is_expired_at(now) || credential.can_refresh(),
            expires_at: Some(credential.expires_at),
            external_urn: credential.external_urn.clone(),
        }
    }
}
