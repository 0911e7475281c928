//! Filesystem implementation of the `MediaSourceLoader` port

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use socialpub_core::MediaSourceLoader;
use socialpub_domain::{MediaKind, MediaPayload, MediaSource, Result, SocialPubError};
use tracing::debug;

/// Default upper bound on a single media file.
pub const DEFAULT_MAX_BYTES: u64 = 200 * 1024 * 1024;

/// Reads media bytes from local files
///
/// Relative references resolve against `root` when one is set. The content
/// type comes from the file extension and must agree with the declared
/// media kind.
#[derive(Debug, Clone)]
pub struct FsMediaSourceLoader {
    root: Option<PathBuf>,
    max_bytes: u64,
}

impl Default for FsMediaSourceLoader {
    fn default() -> Self {
        Self { root: None, max_bytes: DEFAULT_MAX_BYTES }
    }
}

impl FsMediaSourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub const fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl MediaSourceLoader for FsMediaSourceLoader {
    async fn load(&self, source: &MediaSource) -> Result<MediaPayload> {
        let path = self.resolve(&source.reference);

        let content_type = match content_type_for(&path) {
            Some((kind, content_type)) if kind == source.kind => content_type,
            Some((kind, _)) => {
                return Err(SocialPubError::InvalidInput(format!(
                    "{} looks like {kind} media but was attached as {}",
                    source.reference, source.kind
                )));
            }
            None => {
                return Err(SocialPubError::InvalidInput(format!(
                    "unsupported media type for {}",
                    source.reference
                )));
            }
        };

        let metadata = tokio::fs::metadata(&path).await.map_err(|err| io_error(&path, &err))?;
        if !metadata.is_file() {
            return Err(SocialPubError::InvalidInput(format!("{} is not a file", path.display())));
        }
        if metadata.len() > self.max_bytes {
            return Err(SocialPubError::InvalidInput(format!(
                "{} is {} bytes, above the {} byte limit",
                path.display(),
                metadata.len(),
                self.max_bytes
            )));
        }

        let bytes = tokio::fs::read(&path).await.map_err(|err| io_error(&path, &err))?;
        if bytes.is_empty() {
            return Err(SocialPubError::InvalidInput(format!("{} is empty", path.display())));
        }

        debug!(path = %path.display(), bytes = bytes.len(), content_type, "media loaded");
        Ok(MediaPayload { bytes, content_type: content_type.to_string() })
    }
}

/// Media kind and MIME type implied by a file extension.
pub fn content_type_for(path: &Path) -> Option<(MediaKind, &'static str)> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let found = match extension.as_str() {
        "jpg" | "jpeg" => (MediaKind::Image, "image/jpeg"),
        "png" => (MediaKind::Image, "image/png"),
        "gif" => (MediaKind::Image, "image/gif"),
        "webp" => (MediaKind::Image, "image/webp"),
        "mp4" => (MediaKind::Video, "video/mp4"),
        "mov" => (MediaKind::Video, "video/quicktime"),
        "webm" => (MediaKind::Video, "video/webm"),
        _ => return None,
    };
    Some(found)
}

fn io_error(path: &Path, err: &std::io::Error) -> SocialPubError {
    match err.kind() {
        ErrorKind::NotFound => SocialPubError::NotFound(format!("{} does not exist", path.display())),
        _ => SocialPubError::Internal(format!("failed to read {}: {err}", path.display())),
    }
}
