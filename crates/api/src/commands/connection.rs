//! Account connection commands

use socialpub_domain::{AuthError, ConnectionStatus};

use crate::utils::command_helpers::execute_logged;
use crate::AppContext;

/// Thin read of the stored credential; never refreshes.
///
/// # Errors
/// `AuthError::Storage` if the credential store failed.
pub async fn get_connection_status(
    ctx: &AppContext,
    subject_id: &str,
) -> Result<ConnectionStatus, AuthError> {
    execute_logged("connection::get_connection_status", move || async move {
        ctx.tokens.connection_status(subject_id).await
    })
    .await
}

/// Finish the authorization flow with the code the platform redirected back.
///
/// # Errors
/// `ReauthorizationRequired` if the code was rejected, `RefreshUnavailable`
/// if the platform could not be reached.
pub async fn connect_account(
    ctx: &AppContext,
    subject_id: &str,
    code: &str,
) -> Result<ConnectionStatus, AuthError> {
    execute_logged("connection::connect_account", move || async move {
        if code.trim().is_empty() {
            return Err(AuthError::ReauthorizationRequired {
                subject_id: subject_id.to_string(),
                reason: "authorization code is empty".to_string(),
            });
        }
        ctx.tokens.connect(subject_id, code.trim()).await
    })
    .await
}

/// Forget the subject's credential. Returns whether one existed.
///
/// # Errors
/// `AuthError::Storage` if the credential store failed.
pub async fn disconnect_account(ctx: &AppContext, subject_id: &str) -> Result<bool, AuthError> {
    execute_logged("connection::disconnect_account", move || async move {
        ctx.tokens.disconnect(subject_id).await
    })
    .await
}
