//! # SocialPub API
//!
//! Application layer - command surface and dependency wiring.
//!
//! This crate contains:
//! - Commands (UI layer → publishing core bridge)
//! - Application context (dependency injection)
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
