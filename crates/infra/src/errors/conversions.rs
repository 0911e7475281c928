//! Conversions from external infrastructure errors into domain errors.

use r2d2::Error as PoolError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use socialpub_domain::{PlatformError, SocialPubError};

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SocialPubError);

impl From<InfraError> for SocialPubError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SocialPubError> for InfraError {
    fn from(value: SocialPubError) -> Self {
        Self(value)
    }
}

trait IntoSocialPubError {
    fn into_socialpub(self) -> SocialPubError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → SocialPubError */
/* -------------------------------------------------------------------------- */

impl IntoSocialPubError for SqlError {
    fn into_socialpub(self) -> SocialPubError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        SocialPubError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        SocialPubError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        SocialPubError::Database("unique constraint violation".into())
                    }
                    _ => SocialPubError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => SocialPubError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                SocialPubError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                SocialPubError::Database(format!("invalid column type for {name}: {ty}"))
            }
            RE::InvalidPath(path) => SocialPubError::Config(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => SocialPubError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_socialpub())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → SocialPubError */
/* -------------------------------------------------------------------------- */

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        Self(SocialPubError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → SocialPubError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        Self(SocialPubError::Database(format!("stored JSON is invalid: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PlatformError */
/* -------------------------------------------------------------------------- */

/// Classify a reqwest failure that produced no HTTP response.
#[must_use]
pub fn transport_error(err: &HttpError) -> PlatformError {
    if err.is_builder() {
        return PlatformError::Config(format!("invalid request: {err}"));
    }
    if err.is_timeout() {
        return PlatformError::Transport {
            message: format!("HTTP request timed out: {err}"),
            timed_out: true,
        };
    }
    if err.is_connect() {
        return PlatformError::Transport {
            message: format!("HTTP connection failure: {err}"),
            timed_out: false,
        };
    }
    PlatformError::Transport { message: err.to_string(), timed_out: false }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(SocialPubError::Network(transport_error(&value).to_string()))
    }
}

/// Map a terminal non-2xx status and its body message.
#[must_use]
pub fn platform_error_for_status(status: u16, message: String) -> PlatformError {
    match status {
        401 => PlatformError::Unauthorized(message),
        _ => PlatformError::Rejected { status, message },
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
