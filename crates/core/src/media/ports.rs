//! Port interfaces for media upload

use async_trait::async_trait;
use socialpub_domain::{
    MediaKind, MediaPayload, MediaSource, PlatformAssetStatus, PlatformError, Result,
    UploadRegistration, UploadTarget,
};

/// Platform endpoints driving the register, upload and poll protocol
#[async_trait]
pub trait MediaApi: Send + Sync {
    /// Register an upload for `owner_urn` using the recipe for `kind`
    async fn register_upload(
        &self,
        access_token: &str,
        owner_urn: &str,
        kind: MediaKind,
    ) -> std::result::Result<UploadRegistration, PlatformError>;

    /// Send the raw bytes to the registered target, exactly once
    ///
    /// `target.headers` already carries every header the request needs.
    async fn upload(
        &self,
        target: &UploadTarget,
        payload: MediaPayload,
    ) -> std::result::Result<(), PlatformError>;

    /// Read the platform-side processing state of an asset
    async fn asset_status(
        &self,
        access_token: &str,
        asset_id: &str,
    ) -> std::result::Result<PlatformAssetStatus, PlatformError>;
}

/// Resolves a local media reference to uploadable bytes
#[async_trait]
pub trait MediaSourceLoader: Send + Sync {
    async fn load(&self, source: &MediaSource) -> Result<MediaPayload>;
}
