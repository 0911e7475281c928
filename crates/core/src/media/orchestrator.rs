//! Media upload orchestrator
//!
//! Drives each [`MediaAsset`] of a draft through
//! register -> upload -> poll until the platform reports it ready or failed.
//! Assets are prepared concurrently up to a bounded limit; results are
//! reported in draft order.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use socialpub_domain::{
    MediaAsset, MediaConfig, MediaError, MediaStatus, PlatformAssetStatus, PublishStep,
};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::ports::{MediaApi, MediaSourceLoader};
use crate::auth::{AuthorizedCallError, TokenManager};

/// Polling and concurrency limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaSettings {
    pub poll_interval: Duration,
    pub poll_deadline: Duration,
    pub max_concurrent: usize,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self::from(&MediaConfig::default())
    }
}

impl From<&MediaConfig> for MediaSettings {
    fn from(config: &MediaConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            poll_deadline: config.poll_deadline(),
            max_concurrent: config.max_concurrent_uploads.max(1),
        }
    }
}

/// Prepares media assets so a post can reference them
pub struct MediaUploadOrchestrator {
    api: Arc<dyn MediaApi>,
    loader: Arc<dyn MediaSourceLoader>,
    tokens: Arc<TokenManager>,
    settings: MediaSettings,
}

impl MediaUploadOrchestrator {
    pub fn new(
        api: Arc<dyn MediaApi>,
        loader: Arc<dyn MediaSourceLoader>,
        tokens: Arc<TokenManager>,
        settings: MediaSettings,
    ) -> Self {
        Self { api, loader, tokens, settings }
    }

    #[must_use]
    pub const fn settings(&self) -> &MediaSettings {
        &self.settings
    }

    /// Prepare every asset, returning the first failure in draft order.
    ///
    /// All assets run to completion even when one fails, so each ends in a
    /// definite state. Assets that reached `Ready` stay registered with the
    /// platform and are reused if the same draft is published again.
    ///
    /// # Errors
    /// The failure of the lowest-indexed asset that did not become ready.
    #[instrument(skip(self, assets), fields(count = assets.len()))]
    pub async fn prepare_all(
        &self,
        subject_id: &str,
        owner_urn: &str,
        assets: &mut [MediaAsset],
    ) -> Result<(), MediaError> {
        let results: Vec<Result<(), MediaError>> = stream::iter(assets.iter_mut().enumerate())
            .map(|(index, asset)| self.prepare(subject_id, owner_urn, index, asset))
            .buffered(self.settings.max_concurrent.max(1))
            .collect()
            .await;

        let ready = results.iter().filter(|result| result.is_ok()).count();
        match results.into_iter().find_map(Result::err) {
            Some(err) => {
                if ready > 0 {
                    warn!(ready, error = %err, "draft blocked; ready assets left in place");
                }
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Drive one asset to `Ready`.
    ///
    /// A `Ready` asset is left untouched and a `Processing` asset resumes
    /// polling. An asset interrupted between registration and upload cannot
    /// be resumed because the upload is sent once per registration.
    ///
    /// # Errors
    /// A [`MediaError`] naming the failed step for asset `index`.
    #[instrument(skip(self, asset), fields(source = %asset.source().reference, kind = %asset.kind()))]
    pub async fn prepare(
        &self,
        subject_id: &str,
        owner_urn: &str,
        index: usize,
        asset: &mut MediaAsset,
    ) -> Result<(), MediaError> {
        asset.check_consistency().map_err(|err| invalid_state(index, &err))?;
        match asset.status() {
            MediaStatus::Ready => {
                debug!(index, "asset already ready");
                Ok(())
            }
            MediaStatus::Failed => Err(MediaError::ProcessingFailed {
                index,
                asset_id: asset.provisional_id().unwrap_or_default().to_string(),
                reason: asset.failure().unwrap_or("asset previously failed").to_string(),
            }),
            MediaStatus::Registered | MediaStatus::Uploading => Err(MediaError::InvalidState {
                index,
                message: format!(
                    "upload was interrupted while {}; attach the media again",
                    asset.status()
                ),
            }),
            MediaStatus::Processing => self.poll_until_ready(subject_id, index, asset).await,
            MediaStatus::Pending => {
                self.register_and_upload(subject_id, owner_urn, index, asset).await?;
                self.poll_until_ready(subject_id, index, asset).await
            }
        }
    }

    async fn register_and_upload(
        &self,
        subject_id: &str,
        owner_urn: &str,
        index: usize,
        asset: &mut MediaAsset,
    ) -> Result<(), MediaError> {
        let source_ref = asset.source().reference.clone();
        let kind = asset.kind();

        let payload = self.loader.load(asset.source()).await.map_err(|err| MediaError::Source {
            index,
            source_ref: source_ref.clone(),
            message: err.to_string(),
        })?;

        let api = self.api.as_ref();
        let registration = self
            .tokens
            .with_reauth(subject_id, move |token| async move {
                api.register_upload(&token, owner_urn, kind).await
            })
            .await;

        let registration = match registration {
            Ok(registration) => registration,
            Err(AuthorizedCallError::Auth(cause)) => {
                return Err(MediaError::Auth { index, step: PublishStep::RegisterUpload, cause });
            }
            Err(AuthorizedCallError::Platform(cause)) => {
                warn!(index, error = %cause, "upload registration failed");
                mark_failed(asset, index, &cause.to_string());
                return Err(MediaError::RegistrationFailed { index, source_ref, cause });
            }
        };

        let asset_id = registration.asset_id.clone();
        asset.register(registration).map_err(|err| invalid_state(index, &err))?;
        debug!(index, %asset_id, "upload registered");

        // Bearer is added only when the registration did not supply auth.
        let mut target = asset
            .upload_target()
            .cloned()
            .ok_or_else(|| MediaError::InvalidState {
                index,
                message: "registered asset has no upload target".to_string(),
            })?;
        if !target.has_header("authorization") {
            let credential = self.tokens.get_valid_token(subject_id).await.map_err(|cause| {
                MediaError::Auth { index, step: PublishStep::UploadMedia, cause }
            })?;
            target.headers.insert("Authorization".to_string(), credential.bearer());
        }

        asset.begin_upload().map_err(|err| invalid_state(index, &err))?;
        let bytes = payload.bytes.len();
        if let Err(cause) = self.api.upload(&target, payload).await {
            warn!(index, %asset_id, error = %cause, "binary upload failed");
            mark_failed(asset, index, &cause.to_string());
            return Err(MediaError::UploadFailed { index, asset_id, cause });
        }
        asset.finish_upload().map_err(|err| invalid_state(index, &err))?;

        info!(index, %asset_id, bytes, "media uploaded");
        Ok(())
    }

    async fn poll_until_ready(
        &self,
        subject_id: &str,
        index: usize,
        asset: &mut MediaAsset,
    ) -> Result<(), MediaError> {
        let asset_id = asset
            .provisional_id()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| MediaError::InvalidState {
                index,
                message: "processing asset has no provisional id".to_string(),
            })?
            .to_string();
        let started = Instant::now();
        let deadline = started + self.settings.poll_deadline;
        let api = self.api.as_ref();
        let mut polls = 0_u32;

        loop {
            polls += 1;
            let id = asset_id.as_str();
            let status = self
                .tokens
                .with_reauth(subject_id, move |token| async move {
                    api.asset_status(&token, id).await
                })
                .await;

            match status {
                Ok(PlatformAssetStatus::Ready { asset_id: remote_id }) => {
                    asset.mark_ready(remote_id).map_err(|err| invalid_state(index, &err))?;
                    info!(index, %asset_id, polls, "media ready");
                    return Ok(());
                }
                Ok(PlatformAssetStatus::Failed { reason }) => {
                    warn!(index, %asset_id, %reason, "platform rejected media");
                    mark_failed(asset, index, &reason);
                    return Err(MediaError::ProcessingFailed { index, asset_id, reason });
                }
                Ok(PlatformAssetStatus::Pending { status }) => {
                    debug!(index, %asset_id, %status, polls, "media still processing");
                }
                Err(AuthorizedCallError::Auth(cause)) => {
                    return Err(MediaError::Auth { index, step: PublishStep::PollMedia, cause });
                }
                Err(AuthorizedCallError::Platform(cause)) => {
                    return Err(MediaError::StatusUnavailable { index, asset_id, cause });
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                let waited_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                warn!(index, %asset_id, waited_ms, "media processing deadline reached");
                return Err(MediaError::ProcessingTimeout { index, asset_id, waited_ms });
            }
            tokio::time::sleep(self.settings.poll_interval.min(remaining)).await;
        }
    }
}

fn mark_failed(asset: &mut MediaAsset, index: usize, reason: &str) {
    if let Err(err) = asset.mark_failed(reason) {
        debug!(index, error = %err, "asset already terminal");
    }
}

fn invalid_state(index: usize, err: &impl std::fmt::Display) -> MediaError {
    MediaError::InvalidState { index, message: err.to_string() }
}
