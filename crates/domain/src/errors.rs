//! Error types used throughout the publishing core
//!
//! Layers, innermost first:
//! - [`PlatformError`]: classification of one call to the external platform
//! - [`AuthError`]: outcome of obtaining a valid credential
//! - [`MediaError`]: terminal failure of one media asset
//! - [`PublishError`]: what a caller of `publish` gets back
//!
//! [`SocialPubError`] covers plumbing (storage, configuration, wiring) that
//! is not specific to one publish.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Plumbing error for storage, configuration and wiring
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SocialPubError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for plumbing operations
pub type Result<T> = std::result::Result<T, SocialPubError>;

/// Classified failure of a single platform call
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum PlatformError {
    /// No response was received after the client's retries were exhausted
    #[error("Transport failure: {message}")]
    Transport { message: String, timed_out: bool },

    /// The platform rejected the bearer token (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other terminal non-2xx response
    #[error("Platform rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// A 2xx response whose body could not be understood
    #[error("Invalid platform response: {0}")]
    InvalidResponse(String),

    /// The request could not be built
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl PlatformError {
    /// Whether the failure reflects a transient condition that outlived the
    /// client's retry budget.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Rejected { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Self::Unauthorized(_) | Self::InvalidResponse(_) | Self::Config(_) => false,
        }
    }

    /// Whether the failure is an authentication rejection.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Failure to obtain a currently valid credential
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum AuthError {
    /// No credential is stored for the subject
    #[error("Subject {subject_id} has not connected an account")]
    NotConnected { subject_id: String },

    /// The credential cannot be refreshed; the subject must authorize again
    #[error("Subject {subject_id} must re-authorize: {reason}")]
    ReauthorizationRequired { subject_id: String, reason: String },

    /// The token endpoint could not be reached after retries
    #[error("Token refresh for {subject_id} unavailable: {cause}")]
    RefreshUnavailable { subject_id: String, cause: PlatformError },

    /// The token store failed
    #[error("Credential storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Whether the caller must run the authorization flow again.
    #[must_use]
    pub const fn requires_reauthorization(&self) -> bool {
        matches!(self, Self::NotConnected { .. } | Self::ReauthorizationRequired { .. })
    }
}

impl From<SocialPubError> for AuthError {
    fn from(err: SocialPubError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Step of the publish pipeline, used to attribute failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStep {
    Authenticate,
    LoadMedia,
    RegisterUpload,
    UploadMedia,
    PollMedia,
    CreatePost,
}

crate::impl_domain_status_conversions!(PublishStep {
    Authenticate => "authenticate",
    LoadMedia => "load_media",
    RegisterUpload => "register_upload",
    UploadMedia => "upload_media",
    PollMedia => "poll_media",
    CreatePost => "create_post",
});

/// Terminal failure for one media asset
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum MediaError {
    #[error("Media {index} ({source_ref}) could not be read: {message}")]
    Source { index: usize, source_ref: String, message: String },

    #[error("Upload registration for media {index} ({source_ref}) failed: {cause}")]
    RegistrationFailed { index: usize, source_ref: String, cause: PlatformError },

    #[error("Binary upload for media {index} (asset {asset_id}) failed: {cause}")]
    UploadFailed { index: usize, asset_id: String, cause: PlatformError },

    #[error("Platform processing of media {index} (asset {asset_id}) failed: {reason}")]
    ProcessingFailed { index: usize, asset_id: String, reason: String },

    #[error("Media {index} (asset {asset_id}) still processing after {waited_ms} ms")]
    ProcessingTimeout { index: usize, asset_id: String, waited_ms: u64 },

    #[error("Media {index} could not be authorized at step {step}: {cause}")]
    Auth { index: usize, step: PublishStep, cause: AuthError },

    #[error("Media {index} status polling failed: {cause}")]
    StatusUnavailable { index: usize, asset_id: String, cause: PlatformError },

    #[error("Media {index} is in an invalid state: {message}")]
    InvalidState { index: usize, message: String },
}

impl MediaError {
    /// Position of the failing asset in the draft.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Source { index, .. }
            | Self::RegistrationFailed { index, .. }
            | Self::UploadFailed { index, .. }
            | Self::ProcessingFailed { index, .. }
            | Self::ProcessingTimeout { index, .. }
            | Self::Auth { index, .. }
            | Self::StatusUnavailable { index, .. }
            | Self::InvalidState { index, .. } => *index,
        }
    }
}

/// Classified failure of a publish operation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum PublishError {
    /// Retries were exhausted on a transient failure
    #[error("Transient transport failure during {step}: {message}")]
    TransientTransport { step: PublishStep, message: String },

    /// The credential could not be refreshed; re-authorization is required
    #[error("Authorization expired: {0}")]
    AuthExpired(AuthError),

    /// The draft or request is malformed
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Media {index} ({source_ref}) registration failed: {message}")]
    MediaRegistrationFailed { index: usize, source_ref: String, message: String },

    #[error("Media {index} (asset {asset_id}) upload failed: {message}")]
    MediaUploadFailed { index: usize, asset_id: String, message: String },

    #[error("Media {index} (asset {asset_id}) processing failed: {message}")]
    MediaProcessingFailed { index: usize, asset_id: String, message: String },

    #[error("Media {index} (asset {asset_id}) processing timed out after {waited_ms} ms")]
    MediaProcessingTimeout { index: usize, asset_id: String, waited_ms: u64 },

    /// Terminal non-2xx response from post creation
    #[error("Platform rejected post ({status}): {message}")]
    PlatformRejected { status: u16, message: String },

    /// The caller-supplied deadline elapsed before the post was created
    #[error("Publish deadline of {deadline_ms} ms exceeded")]
    DeadlineExceeded { deadline_ms: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PublishError {
    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TransientTransport { .. } => "transient_transport",
            Self::AuthExpired(_) => "auth_expired",
            Self::Validation(_) => "validation",
            Self::MediaRegistrationFailed { .. } => "media_registration_failed",
            Self::MediaUploadFailed { .. } => "media_upload_failed",
            Self::MediaProcessingFailed { .. } => "media_processing_failed",
            Self::MediaProcessingTimeout { .. } => "media_processing_timeout",
            Self::PlatformRejected { .. } => "platform_rejected",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
            Self::Storage(_) => "storage",
            Self::Internal(_) => "internal",
        }
    }

    /// Map a platform failure observed at `step` outside media handling.
    ///
    /// A 429 that outlives the retries of post creation is a quota
    /// rejection and keeps the platform's message.
    #[must_use]
    pub fn from_platform(step: PublishStep, err: PlatformError) -> Self {
        match err {
            PlatformError::Transport { message, .. } => Self::TransientTransport { step, message },
            PlatformError::Rejected { status: 429, message } if step == PublishStep::CreatePost => {
                Self::PlatformRejected { status: 429, message }
            }
            PlatformError::Rejected { status, message } if err_is_transient_status(status) => {
                Self::TransientTransport { step, message: format!("HTTP {status}: {message}") }
            }
            PlatformError::Rejected { status, message } => {
                if status == 400 || status == 422 {
                    Self::Validation(message)
                } else {
                    Self::PlatformRejected { status, message }
                }
            }
            PlatformError::Unauthorized(message) => Self::PlatformRejected { status: 401, message },
            PlatformError::InvalidResponse(message) => {
                Self::Internal(format!("invalid platform response during {step}: {message}"))
            }
            PlatformError::Config(message) => Self::Validation(message),
        }
    }
}

const fn err_is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

impl From<AuthError> for PublishError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Storage(message) => Self::Storage(message),
            AuthError::RefreshUnavailable { cause, .. } => {
                Self::from_platform(PublishStep::Authenticate, cause)
            }
            other => Self::AuthExpired(other),
        }
    }
}

impl From<MediaError> for PublishError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Source { index, source_ref, message } => {
                Self::Validation(format!("media {index} ({source_ref}) is unreadable: {message}"))
            }
            MediaError::RegistrationFailed { index, source_ref, cause } => {
                Self::MediaRegistrationFailed { index, source_ref, message: cause.to_string() }
            }
            MediaError::UploadFailed { index, asset_id, cause } => {
                Self::MediaUploadFailed { index, asset_id, message: cause.to_string() }
            }
            MediaError::ProcessingFailed { index, asset_id, reason } => {
                Self::MediaProcessingFailed { index, asset_id, message: reason }
            }
            MediaError::ProcessingTimeout { index, asset_id, waited_ms } => {
                Self::MediaProcessingTimeout { index, asset_id, waited_ms }
            }
            MediaError::Auth { cause, .. } => Self::from(cause),
            MediaError::StatusUnavailable { cause, .. } => {
                Self::from_platform(PublishStep::PollMedia, cause)
            }
            MediaError::InvalidState { index, message } => {
                Self::Internal(format!("media {index}: {message}"))
            }
        }
    }
}

impl From<SocialPubError> for PublishError {
    fn from(err: SocialPubError) -> Self {
        match err {
            SocialPubError::InvalidInput(message) => Self::Validation(message),
            SocialPubError::Database(message) => Self::Storage(message),
            other => Self::Internal(other.to_string()),
        }
    }
}
