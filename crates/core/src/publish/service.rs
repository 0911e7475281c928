//! Post publishing service - top-level entry point of the core
//!
//! `publish` validates the draft, obtains a token, prepares media, composes
//! the post-creation request and submits it. Internal retries are invisible
//! to the caller; the publish itself is never re-attempted automatically.

use std::sync::Arc;
use std::time::Duration;

use socialpub_common::sync::KeyedLock;
use socialpub_common::time::{Clock, SystemClock};
use socialpub_domain::{
    AuthError, PostDraft, PostRequest, PublishError, PublishResult, PublishStep,
};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::ports::{PostApi, PublishLedger};
use crate::auth::{AuthorizedCallError, TokenManager};
use crate::media::MediaUploadOrchestrator;

/// Outcome of everything that happens before post creation
enum Prepared {
    /// A publish with the same idempotency key already succeeded
    Replayed(PublishResult),
    Ready(PostRequest),
}

/// Publishes drafts on behalf of subjects
pub struct PostPublisher {
    tokens: Arc<TokenManager>,
    media: Arc<MediaUploadOrchestrator>,
    posts: Arc<dyn PostApi>,
    ledger: Option<Arc<dyn PublishLedger>>,
    clock: Arc<dyn Clock>,
    deadline: Option<Duration>,
    key_locks: KeyedLock,
}

impl PostPublisher {
    pub fn new(
        tokens: Arc<TokenManager>,
        media: Arc<MediaUploadOrchestrator>,
        posts: Arc<dyn PostApi>,
    ) -> Self {
        Self {
            tokens,
            media,
            posts,
            ledger: None,
            clock: Arc::new(SystemClock),
            deadline: None,
            key_locks: KeyedLock::new(),
        }
    }

    /// Remember results by idempotency key so resubmission is safe.
    #[must_use]
    pub fn with_ledger(mut self, ledger: Arc<dyn PublishLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Bound the time spent before the post-creation call is issued.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Publish `draft` for `subject_id`.
    ///
    /// Media state is written back into the draft, so a draft whose publish
    /// failed after some assets became ready reuses them on resubmission.
    /// When the draft carries an idempotency key and a ledger is configured,
    /// a key that already succeeded returns the recorded result without
    /// contacting the platform.
    ///
    /// If the deadline passes while media is still being prepared, the
    /// publish reports `DeadlineExceeded` and no post-creation call is made.
    ///
    /// # Errors
    /// A classified [`PublishError`] naming the failed step.
    #[instrument(
        skip(self, draft),
        fields(media = draft.media.len(), keyed = draft.idempotency_key.is_some())
    )]
    pub async fn publish(
        &self,
        draft: &mut PostDraft,
        subject_id: &str,
    ) -> Result<PublishResult, PublishError> {
        draft.validate()?;

        let _key_guard = match &draft.idempotency_key {
            Some(key) => Some(self.key_locks.lock(&format!("{subject_id}:{key}")).await),
            None => None,
        };

        let prepared = match self.deadline {
            Some(limit) => {
                let deadline_at = Instant::now() + limit;
                let prepared =
                    tokio::time::timeout_at(deadline_at, self.prepare(draft, subject_id))
                        .await
                        .map_err(|_| deadline_exceeded(limit))??;
                if Instant::now() >= deadline_at {
                    return Err(deadline_exceeded(limit));
                }
                prepared
            }
            None => self.prepare(draft, subject_id).await?,
        };

        let request = match prepared {
            Prepared::Replayed(result) => {
                info!(post_id = %result.remote_post_id(), "idempotent replay of earlier publish");
                return Ok(result);
            }
            Prepared::Ready(request) => request,
        };

        let created = self.create(subject_id, &request).await?;
        let result = PublishResult::new(created.post_id, self.clock.now());

        if let (Some(ledger), Some(key)) = (&self.ledger, &request.idempotency_key) {
            if let Err(err) = ledger.record(subject_id, key, &result).await {
                warn!(error = %err, "post created but idempotency record failed");
            }
        }

        info!(post_id = %result.remote_post_id(), "post published");
        Ok(result)
    }

    async fn prepare(
        &self,
        draft: &mut PostDraft,
        subject_id: &str,
    ) -> Result<Prepared, PublishError> {
        if let (Some(ledger), Some(key)) = (&self.ledger, &draft.idempotency_key) {
            if let Some(existing) = ledger.find(subject_id, key).await? {
                return Ok(Prepared::Replayed(existing));
            }
        }

        let credential = self.tokens.get_valid_token(subject_id).await?;
        let author_urn = credential.external_urn.clone().ok_or_else(|| {
            PublishError::AuthExpired(AuthError::ReauthorizationRequired {
                subject_id: subject_id.to_string(),
                reason: "no platform identity recorded for the credential".to_string(),
            })
        })?;

        if !draft.media.is_empty() {
            self.media.prepare_all(subject_id, &author_urn, draft.media_mut()).await?;
        }
        if !draft.all_ready() {
            return Err(PublishError::Internal("media not ready after preparation".to_string()));
        }

        let request = PostRequest::from_draft(draft, author_urn)?;
        debug!(media = request.media.len(), "post request composed");
        Ok(Prepared::Ready(request))
    }

    async fn create(
        &self,
        subject_id: &str,
        request: &PostRequest,
    ) -> Result<socialpub_domain::CreatedPost, PublishError> {
        let posts = self.posts.as_ref();
        self.tokens
            .with_reauth(subject_id, move |token| async move {
                posts.create_post(&token, request).await
            })
            .await
            .map_err(|err| match err {
                AuthorizedCallError::Auth(cause) => PublishError::from(cause),
                AuthorizedCallError::Platform(cause) if cause.is_unauthorized() => {
                    PublishError::AuthExpired(AuthError::ReauthorizationRequired {
                        subject_id: subject_id.to_string(),
                        reason: format!("refreshed token was also rejected: {cause}"),
                    })
                }
                AuthorizedCallError::Platform(cause) => {
                    PublishError::from_platform(PublishStep::CreatePost, cause)
                }
            })
    }
}

fn deadline_exceeded(limit: Duration) -> PublishError {
    PublishError::DeadlineExceeded {
        deadline_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
    }
}
