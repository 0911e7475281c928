//! Post draft and publish result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::{MediaAsset, MediaKind};
use crate::constants::{MAX_COMMENTARY_CHARS, MAX_IDEMPOTENCY_KEY_LEN, MAX_MEDIA_PER_POST};
use crate::errors::PublishError;

/// Audience of a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    ConnectionsOnly,
}

crate::impl_domain_status_conversions!(Visibility {
    Public => "public",
    ConnectionsOnly => "connections_only",
});

/// In-memory representation of a not-yet-submitted post
///
/// Media order is display order and is preserved in the created post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    pub commentary: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub media: Vec<MediaAsset>,
    /// Caller-supplied key that makes resubmission safe
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl PostDraft {
    #[must_use]
    pub fn new(commentary: impl Into<String>) -> Self {
        Self {
            commentary: commentary.into(),
            visibility: Visibility::Public,
            media: Vec::new(),
            idempotency_key: None,
        }
    }

    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn with_media(mut self, asset: MediaAsset) -> Self {
        self.media.push(asset);
        self
    }

    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn media_mut(&mut self) -> &mut [MediaAsset] {
        &mut self.media
    }

    /// Whether every attached asset is `Ready`. An empty list counts.
    #[must_use]
    pub fn all_ready(&self) -> bool {
        self.media.iter().all(MediaAsset::is_ready)
    }

    /// Kind shared by every attached asset, if any media is present.
    #[must_use]
    pub fn media_kind(&self) -> Option<MediaKind> {
        self.media.first().map(MediaAsset::kind)
    }

    /// Check the draft before any network work happens.
    ///
    /// # Errors
    /// Returns `PublishError::Validation` naming the first violated rule.
    pub fn validate(&self) -> Result<(), PublishError> {
        let chars = self.commentary.chars().count();
        if self.media.is_empty() && self.commentary.trim().is_empty() {
            return Err(PublishError::Validation(
                "a post needs commentary or at least one media asset".into(),
            ));
        }
        if chars > MAX_COMMENTARY_CHARS {
            return Err(PublishError::Validation(format!(
                "commentary is {chars} characters, limit is {MAX_COMMENTARY_CHARS}"
            )));
        }
        if self.media.len() > MAX_MEDIA_PER_POST {
            return Err(PublishError::Validation(format!(
                "{} media assets attached, limit is {MAX_MEDIA_PER_POST}",
                self.media.len()
            )));
        }
        if let Some(kind) = self.media_kind() {
            if self.media.iter().any(|asset| asset.kind() != kind) {
                return Err(PublishError::Validation(
                    "images and videos cannot be mixed in one post".into(),
                ));
            }
        }
        if let Some(key) = &self.idempotency_key {
            if key.trim().is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
                return Err(PublishError::Validation(format!(
                    "idempotency key must be 1-{MAX_IDEMPOTENCY_KEY_LEN} bytes"
                )));
            }
        }
        Ok(())
    }
}

/// Outcome of a successful publish; immutable once produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    remote_post_id: String,
    created_at: DateTime<Utc>,
}

impl PublishResult {
    #[must_use]
    pub fn new(remote_post_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self { remote_post_id: remote_post_id.into(), created_at }
    }

    #[must_use]
    pub fn remote_post_id(&self) -> &str {
        &self.remote_post_id
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Ready media reference embedded in a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyMedia {
    pub asset_id: String,
    pub kind: MediaKind,
}

/// Fully resolved post-creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRequest {
    pub author_urn: String,
    pub commentary: String,
    pub visibility: Visibility,
    pub media: Vec<ReadyMedia>,
    pub idempotency_key: Option<String>,
}

impl PostRequest {
    /// Compose the request from a draft whose media are all `Ready`.
    ///
    /// # Errors
    /// Returns `PublishError::Internal` if any asset is not `Ready`.
    pub fn from_draft(draft: &PostDraft, author_urn: impl Into<String>) -> Result<Self, PublishError> {
        let media = draft
            .media
            .iter()
            .enumerate()
            .map(|(index, asset)| {
                asset
                    .remote_asset_id()
                    .map(|asset_id| ReadyMedia { asset_id: asset_id.to_string(), kind: asset.kind() })
                    .ok_or_else(|| {
                        PublishError::Internal(format!(
                            "media {index} is {} and cannot be referenced",
                            asset.status()
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            author_urn: author_urn.into(),
            commentary: draft.commentary.clone(),
            visibility: draft.visibility,
            media,
            idempotency_key: draft.idempotency_key.clone(),
        })
    }
}

/// Platform acknowledgement of a created post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPost {
    pub post_id: String,
}
