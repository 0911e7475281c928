//! Command execution helpers
//!
//! Provides utilities to reduce boilerplate when implementing commands with
//! timing and logging.

use std::future::Future;
use std::time::Instant;

use crate::utils::logging::{log_command_execution, ErrorLabel};

/// Execute a command with automatic timing and logging
///
/// # Example
///
/// ```rust,ignore
/// pub async fn my_command(ctx: &AppContext, subject_id: &str) -> Result<Status, AuthError> {
///     execute_logged("connection::my_command", move || async move {
///         ctx.tokens.connection_status(subject_id).await
///     })
///     .await
/// }
/// ```
pub async fn execute_logged<F, Fut, T, E>(command_name: &str, command_fn: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: ErrorLabel,
{
    let start = Instant::now();

    let result = command_fn().await;

    let label = result.as_ref().err().map(ErrorLabel::error_label);
    log_command_execution(command_name, start.elapsed(), label);

    result
}
