//! Post publishing command

use socialpub_domain::{PostDraft, PublishError, PublishResult};
use tracing::info;

use crate::utils::command_helpers::execute_logged;
use crate::AppContext;

/// Publish `draft` on behalf of `subject_id`.
///
/// The draft is updated in place with per-asset media progress, so a draft
/// that failed after some media became ready can be resubmitted without
/// uploading that media again.
///
/// # Errors
/// The classified [`PublishError`] from the publisher. An empty subject id
/// is a `Validation` error.
pub async fn publish_post(
    ctx: &AppContext,
    subject_id: &str,
    draft: &mut PostDraft,
) -> Result<PublishResult, PublishError> {
    let command_name = "publish::publish_post";

    execute_logged(command_name, move || async move {
        let subject_id = subject_id.trim();
        if subject_id.is_empty() {
            return Err(PublishError::Validation("subject id must not be empty".to_string()));
        }

        info!(
            command = command_name,
            media = draft.media.len(),
            keyed = draft.idempotency_key.is_some(),
            "publishing post"
        );
        ctx.publisher.publish(draft, subject_id).await
    })
    .await
}
