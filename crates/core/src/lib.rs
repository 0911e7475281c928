//! # SocialPub Core
//!
//! Publishing logic with no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for credential storage, the OAuth provider,
//!   the media endpoints, post creation and the publish ledger
//! - `TokenManager`: serialized per-subject token refresh
//! - `MediaUploadOrchestrator`: register, upload and poll state machine
//! - `PostPublisher`: the top-level publish operation
//!
//! ## Architecture Principles
//! - Depends only on `socialpub-common` and `socialpub-domain`
//! - No database, HTTP, or filesystem code
//! - All external dependencies via traits

pub mod auth;
pub mod media;
pub mod publish;

pub use auth::ports::{OAuthClient, TokenStore};
pub use auth::{AuthorizedCallError, TokenManager};
pub use media::ports::{MediaApi, MediaSourceLoader};
pub use media::{MediaSettings, MediaUploadOrchestrator};
pub use publish::ports::{PostApi, PublishLedger};
pub use publish::PostPublisher;
