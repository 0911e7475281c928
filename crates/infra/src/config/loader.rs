//! Configuration loader
//!
//! Builds the application [`Config`] from an optional file plus environment
//! overrides.
//!
//! ## Loading Strategy
//! 1. Load `.env` into the process environment if present
//! 2. Read the first config file found by [`probe_config_paths`], or start
//!    from defaults when there is none
//! 3. Apply `SOCIALPUB_*` environment overrides on top
//! 4. Validate the result
//!
//! ## Environment Variables
//! - `SOCIALPUB_CONFIG`: Explicit config file path
//! - `SOCIALPUB_API_BASE_URL`, `SOCIALPUB_OAUTH_BASE_URL`
//! - `SOCIALPUB_CLIENT_ID`, `SOCIALPUB_CLIENT_SECRET`, `SOCIALPUB_REDIRECT_URI`
//! - `SOCIALPUB_SCOPES`: Space or comma separated scopes
//! - `SOCIALPUB_HTTP_TIMEOUT_MS`, `SOCIALPUB_HTTP_MAX_RETRIES`
//! - `SOCIALPUB_REFRESH_MARGIN_SECS`
//! - `SOCIALPUB_MEDIA_POLL_INTERVAL_MS`, `SOCIALPUB_MEDIA_POLL_DEADLINE_SECS`
//! - `SOCIALPUB_MEDIA_MAX_CONCURRENT`
//! - `SOCIALPUB_PUBLISH_DEADLINE_SECS`
//! - `SOCIALPUB_DB_PATH`, `SOCIALPUB_DB_POOL_SIZE`
//! - `SOCIALPUB_LOG_LEVEL`, `SOCIALPUB_LOG_JSON`
//!
//! ## File Locations
//! The loader probes `socialpub.{toml,json}` and `config.{toml,json}` in the
//! current directory, its two parents, and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use socialpub_domain::{Config, Result, SocialPubError};

const CONFIG_PATH_VAR: &str = "SOCIALPUB_CONFIG";
const FILE_NAMES: [&str; 4] = ["socialpub.toml", "socialpub.json", "config.toml", "config.json"];

/// Load configuration with the full strategy described in the module docs.
///
/// # Errors
/// Returns `SocialPubError::Config` if a file or variable is malformed or the
/// merged configuration fails validation.
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    let explicit = std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from);
    let config = match explicit.or_else(probe_config_paths) {
        Some(path) => read_file(&path)?,
        None => {
            tracing::debug!("no config file found, starting from defaults");
            Config::default()
        }
    };

    let config = apply_env_overrides(config)?;
    config.validate()?;
    tracing::info!(
        api_base_url = %config.platform.api_base_url,
        db_path = %config.database.path,
        "configuration loaded"
    );
    Ok(config)
}

/// Load configuration from defaults plus environment overrides only.
///
/// # Errors
/// Returns `SocialPubError::Config` for malformed variables or a failed
/// validation.
pub fn load_from_env() -> Result<Config> {
    let config = apply_env_overrides(Config::default())?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file, without environment overrides.
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `SocialPubError::Config` if the file is missing, unreadable,
/// malformed, or fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => p,
        None => probe_config_paths().ok_or_else(|| {
            SocialPubError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    let config = read_file(&config_path)?;
    config.validate()?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(SocialPubError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| SocialPubError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

/// Parse configuration, detecting the format by file extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SocialPubError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SocialPubError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SocialPubError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Return the first existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
        roots.push(cwd.join("../.."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn apply_env_overrides(mut config: Config) -> Result<Config> {
    let platform = &mut config.platform;
    override_string("SOCIALPUB_API_BASE_URL", &mut platform.api_base_url);
    override_string("SOCIALPUB_OAUTH_BASE_URL", &mut platform.oauth_base_url);
    override_string("SOCIALPUB_CLIENT_ID", &mut platform.client_id);
    override_string("SOCIALPUB_REDIRECT_URI", &mut platform.redirect_uri);
    if let Ok(secret) = std::env::var("SOCIALPUB_CLIENT_SECRET") {
        platform.client_secret = Some(secret).filter(|s| !s.is_empty());
    }
    if let Ok(scopes) = std::env::var("SOCIALPUB_SCOPES") {
        platform.scopes = scopes
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }

    override_parsed("SOCIALPUB_HTTP_TIMEOUT_MS", &mut config.http.attempt_timeout_ms)?;
    override_parsed("SOCIALPUB_HTTP_MAX_RETRIES", &mut config.http.max_retries)?;
    override_parsed("SOCIALPUB_REFRESH_MARGIN_SECS", &mut config.auth.refresh_margin_secs)?;
    override_parsed("SOCIALPUB_MEDIA_POLL_INTERVAL_MS", &mut config.media.poll_interval_ms)?;
    override_parsed("SOCIALPUB_MEDIA_POLL_DEADLINE_SECS", &mut config.media.poll_deadline_secs)?;
    override_parsed("SOCIALPUB_MEDIA_MAX_CONCURRENT", &mut config.media.max_concurrent_uploads)?;
    override_parsed("SOCIALPUB_PUBLISH_DEADLINE_SECS", &mut config.publish.deadline_secs)?;
    override_string("SOCIALPUB_DB_PATH", &mut config.database.path);
    override_parsed("SOCIALPUB_DB_POOL_SIZE", &mut config.database.pool_size)?;
    override_string("SOCIALPUB_LOG_LEVEL", &mut config.logging.level);
    config.logging.json = env_bool("SOCIALPUB_LOG_JSON", config.logging.json);

    Ok(config)
}

fn override_string(key: &str, target: &mut String) {
    if let Ok(value) = std::env::var(key) {
        *target = value;
    }
}

fn override_parsed<T>(key: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = std::env::var(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e| SocialPubError::Config(format!("Invalid value for {key}: {e}")))?;
    }
    Ok(())
}

/// Parse a boolean variable.
///
/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
