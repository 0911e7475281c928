//! Configuration loading
//!
//! Merges an optional TOML or JSON file with `SOCIALPUB_*` environment
//! overrides into the domain [`Config`](socialpub_domain::Config).

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
