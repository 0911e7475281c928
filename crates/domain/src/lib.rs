//! # SocialPub Domain
//!
//! Business domain types and models for the publishing core.
//!
//! This crate contains:
//! - Domain data types (Credential, MediaAsset, PostDraft, PublishResult)
//! - The classified error taxonomy surfaced to callers
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other SocialPub crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
