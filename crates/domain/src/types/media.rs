//! Media asset lifecycle types
//!
//! A [`MediaAsset`] moves strictly forward:
//! `Pending -> Registered -> Uploading -> Processing -> Ready | Failed`.
//! `Ready` and `Failed` are terminal, and only a `Ready` asset exposes its
//! remote asset id.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{IMAGE_RECIPE, VIDEO_RECIPE};

/// Kind of media attached to a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

crate::impl_domain_status_conversions!(MediaKind {
    Image => "image",
    Video => "video",
});

impl MediaKind {
    /// Upload recipe URN requested at registration.
    #[must_use]
    pub const fn recipe(self) -> &'static str {
        match self {
            Self::Image => IMAGE_RECIPE,
            Self::Video => VIDEO_RECIPE,
        }
    }

    /// Share media category used in the post payload.
    #[must_use]
    pub const fn share_category(self) -> &'static str {
        match self {
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
        }
    }
}

/// Reference to local media and its kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSource {
    /// Opaque reference resolved by a media source loader, e.g. a file path
    pub reference: String,
    pub kind: MediaKind,
}

/// Raw bytes ready to upload
#[derive(Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPayload")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Where and how to send the binary upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    pub url: String,
    /// Headers the platform requires on the upload request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl UploadTarget {
    /// Case-insensitive header presence check.
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.keys().any(|key| key.eq_ignore_ascii_case(name))
    }
}

/// Response of the register-upload call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRegistration {
    /// Provisional asset identifier
    pub asset_id: String,
    pub upload_target: UploadTarget,
}

/// Platform-side processing state of an uploaded asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlatformAssetStatus {
    /// Still processing; `status` is the raw platform value
    Pending { status: String },
    Ready { asset_id: String },
    Failed { reason: String },
}

/// Local lifecycle state of a media asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaStatus {
    Pending,
    Registered,
    Uploading,
    Processing,
    Ready,
    Failed,
}

crate::impl_domain_status_conversions!(MediaStatus {
    Pending => "pending",
    Registered => "registered",
    Uploading => "uploading",
    Processing => "processing",
    Ready => "ready",
    Failed => "failed",
});

impl MediaStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

/// Rejected lifecycle transition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid media transition from {from} to {to}")]
pub struct MediaTransitionError {
    pub from: MediaStatus,
    pub to: MediaStatus,
}

/// Stored asset whose fields do not match its lifecycle state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{status} media asset has no {missing}")]
pub struct MediaStateError {
    pub status: MediaStatus,
    pub missing: &'static str,
}

/// One piece of media moving through registration, upload and processing
///
/// Deserialization rejects records whose state lacks the ids it implies, e.g.
/// a `processing` asset without a provisional id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MediaAssetRecord")]
pub struct MediaAsset {
    source: MediaSource,
    status: MediaStatus,
    provisional_id: Option<String>,
    upload_target: Option<UploadTarget>,
    remote_asset_id: Option<String>,
    failure: Option<String>,
}

#[derive(Deserialize)]
struct MediaAssetRecord {
    source: MediaSource,
    #[serde(default = "pending")]
    status: MediaStatus,
    #[serde(default)]
    provisional_id: Option<String>,
    #[serde(default)]
    upload_target: Option<UploadTarget>,
    #[serde(default)]
    remote_asset_id: Option<String>,
    #[serde(default)]
    failure: Option<String>,
}

const fn pending() -> MediaStatus {
    MediaStatus::Pending
}

impl TryFrom<MediaAssetRecord> for MediaAsset {
    type Error = MediaStateError;

    fn try_from(record: MediaAssetRecord) -> Result<Self, Self::Error> {
        let asset = Self {
            source: record.source,
            status: record.status,
            provisional_id: record.provisional_id,
            upload_target: record.upload_target,
            remote_asset_id: record.remote_asset_id,
            failure: record.failure,
        };
        asset.check_consistency()?;
        Ok(asset)
    }
}

impl MediaAsset {
    #[must_use]
    pub const fn new(source: MediaSource) -> Self {
        Self {
            source,
            status: MediaStatus::Pending,
            provisional_id: None,
            upload_target: None,
            remote_asset_id: None,
            failure: None,
        }
    }

    /// Convenience constructor for an image reference.
    #[must_use]
    pub fn image(reference: impl Into<String>) -> Self {
        Self::new(MediaSource { reference: reference.into(), kind: MediaKind::Image })
    }

    /// Convenience constructor for a video reference.
    #[must_use]
    pub fn video(reference: impl Into<String>) -> Self {
        Self::new(MediaSource { reference: reference.into(), kind: MediaKind::Video })
    }

    #[must_use]
    pub const fn source(&self) -> &MediaSource {
        &self.source
    }

    #[must_use]
    pub const fn kind(&self) -> MediaKind {
        self.source.kind
    }

    #[must_use]
    pub const fn status(&self) -> MediaStatus {
        self.status
    }

    /// Asset id assigned at registration, before processing completes.
    #[must_use]
    pub fn provisional_id(&self) -> Option<&str> {
        self.provisional_id.as_deref()
    }

    #[must_use]
    pub const fn upload_target(&self) -> Option<&UploadTarget> {
        self.upload_target.as_ref()
    }

    /// Remote asset id; `None` unless the asset is `Ready`.
    #[must_use]
    pub fn remote_asset_id(&self) -> Option<&str> {
        match self.status {
            MediaStatus::Ready => self.remote_asset_id.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status == MediaStatus::Ready
    }

    /// Check that the ids required by the current state are present.
    ///
    /// # Errors
    /// Names the first missing field.
    pub fn check_consistency(&self) -> Result<(), MediaStateError> {
        let present = |value: Option<&str>| value.is_some_and(|v| !v.is_empty());
        let missing = match self.status {
            MediaStatus::Registered | MediaStatus::Uploading
                if !present(self.provisional_id.as_deref()) =>
            {
                Some("provisional id")
            }
            MediaStatus::Registered | MediaStatus::Uploading if self.upload_target.is_none() => {
                Some("upload target")
            }
            MediaStatus::Processing if !present(self.provisional_id.as_deref()) => {
                Some("provisional id")
            }
            MediaStatus::Ready if !present(self.remote_asset_id.as_deref()) => {
                Some("remote asset id")
            }
            _ => None,
        };
        match missing {
            Some(missing) => Err(MediaStateError { status: self.status, missing }),
            None => Ok(()),
        }
    }

    /// Record a successful registration.
    ///
    /// # Errors
    /// Fails unless the asset is `Pending`.
    pub fn register(&mut self, registration: UploadRegistration) -> Result<(), MediaTransitionError> {
        self.advance(MediaStatus::Pending, MediaStatus::Registered)?;
        self.provisional_id = Some(registration.asset_id);
        self.upload_target = Some(registration.upload_target);
        Ok(())
    }

    /// # Errors
    /// Fails unless the asset is `Registered`.
    pub fn begin_upload(&mut self) -> Result<(), MediaTransitionError> {
        self.advance(MediaStatus::Registered, MediaStatus::Uploading)
    }

    /// # Errors
    /// Fails unless the asset is `Uploading`.
    pub fn finish_upload(&mut self) -> Result<(), MediaTransitionError> {
        self.advance(MediaStatus::Uploading, MediaStatus::Processing)
    }

    /// Record platform confirmation that the asset is usable.
    ///
    /// # Errors
    /// Fails unless the asset is `Processing`.
    pub fn mark_ready(&mut self, asset_id: impl Into<String>) -> Result<(), MediaTransitionError> {
        self.advance(MediaStatus::Processing, MediaStatus::Ready)?;
        self.remote_asset_id = Some(asset_id.into());
        Ok(())
    }

    /// Move the asset to the terminal `Failed` state.
    ///
    /// # Errors
    /// Fails if the asset is already terminal.
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<(), MediaTransitionError> {
        if self.status.is_terminal() {
            return Err(MediaTransitionError { from: self.status, to: MediaStatus::Failed });
        }
        self.status = MediaStatus::Failed;
        self.failure = Some(reason.into());
        Ok(())
    }

    fn advance(&mut self, expected: MediaStatus, next: MediaStatus) -> Result<(), MediaTransitionError> {
        if self.status != expected {
            return Err(MediaTransitionError { from: self.status, to: next });
        }
        self.status = next;
        Ok(())
    }
}
