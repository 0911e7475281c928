//! Domain types and models

pub mod credential;
pub mod media;
pub mod post;

pub use credential::{parse_scopes, ConnectionStatus, Credential, PlatformIdentity, TokenGrant};
pub use media::{
    MediaAsset, MediaKind, MediaPayload, MediaSource, MediaStateError, MediaStatus, MediaTransitionError,
    PlatformAssetStatus, UploadRegistration, UploadTarget,
};
pub use post::{CreatedPost, PostDraft, PostRequest, PublishResult, ReadyMedia, Visibility};
