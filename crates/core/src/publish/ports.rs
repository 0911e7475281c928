//! Port interfaces for post creation and publish bookkeeping

use async_trait::async_trait;
use socialpub_domain::{CreatedPost, PlatformError, PostRequest, PublishResult, Result};

/// Platform post-creation endpoint
#[async_trait]
pub trait PostApi: Send + Sync {
    async fn create_post(
        &self,
        access_token: &str,
        request: &PostRequest,
    ) -> std::result::Result<CreatedPost, PlatformError>;
}

/// Results of completed publishes keyed by caller idempotency key
#[async_trait]
pub trait PublishLedger: Send + Sync {
    /// Look up an earlier result for `key` published by `subject_id`
    async fn find(&self, subject_id: &str, key: &str) -> Result<Option<PublishResult>>;

    /// Remember the result of a successful publish
    async fn record(&self, subject_id: &str, key: &str, result: &PublishResult) -> Result<()>;
}
