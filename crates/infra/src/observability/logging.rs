//! Global tracing subscriber installation

use once_cell::sync::OnceCell;
use socialpub_domain::{LoggingConfig, Result, SocialPubError};
use tracing_subscriber::EnvFilter;

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Build the event filter for `config`.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies to every
/// target.
///
/// # Errors
/// Returns `SocialPubError::Config` if the configured directive is invalid.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|err| {
            SocialPubError::Config(format!("invalid log level '{}': {err}", config.level))
        }),
    }
}

/// Install the global subscriber once per process.
///
/// Later calls are no-ops, as is a call made after another subscriber was
/// installed by the host.
///
/// # Errors
/// Returns `SocialPubError::Config` if the filter directive cannot be parsed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    INSTALLED.get_or_try_init(|| {
        let filter = build_filter(config)?;
        let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

        let installed = if config.json {
            builder.json().with_current_span(false).try_init().is_ok()
        } else {
            builder.try_init().is_ok()
        };

        if installed {
            tracing::debug!(level = %config.level, json = config.json, "tracing initialised");
        }
        Ok::<(), SocialPubError>(())
    })?;
    Ok(())
}
