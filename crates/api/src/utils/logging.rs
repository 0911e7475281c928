use std::time::Duration;

use socialpub_domain::{AuthError, PublishError};
use tracing::{info, warn};

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"publish::publish_post"`).
/// * `elapsed` - Duration the command execution took.
/// * `error_label` - Stable failure label, `None` on success.
///
/// Callers must avoid forwarding sensitive values in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, error_label: Option<&str>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error_label {
        None => info!(command, duration_ms, success = true, "command_execution_success"),
        Some(error_label) => {
            warn!(command, duration_ms, success = false, error_label, "command_execution_failure");
        }
    }
}

/// Errors that map to a stable label suitable for metrics/logging.
pub trait ErrorLabel {
    fn error_label(&self) -> &'static str;
}

impl ErrorLabel for PublishError {
    #[inline]
    fn error_label(&self) -> &'static str {
        self.kind()
    }
}

impl ErrorLabel for AuthError {
    #[inline]
    fn error_label(&self) -> &'static str {
        match self {
            Self::NotConnected { .. } => "not_connected",
            Self::ReauthorizationRequired { .. } => "reauthorization_required",
            Self::RefreshUnavailable { .. } => "refresh_unavailable",
            Self::Storage(_) => "storage",
        }
    }
}
