//! # SocialPub Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The retrying HTTP client shared by all platform calls
//! - The LinkedIn adapter (OAuth, identity, media, posts)
//! - SQLite and in-memory credential stores and publish ledgers
//! - Filesystem media loading
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `socialpub-core`
//! - Contains all "impure" code (network, disk, environment)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod media;
pub mod memory;
pub mod observability;

// Re-export commonly used items
pub use database::{DbManager, SqliteCredentialRepository, SqlitePublishLedger};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::linkedin::{LinkedInClient, LinkedInEndpoints, LinkedInOAuthClient};
pub use media::FsMediaSourceLoader;
pub use memory::{MemoryPublishLedger, MemoryTokenStore};
pub use observability::init_tracing;
