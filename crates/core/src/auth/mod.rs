//! Credential lifecycle for platform subjects

pub mod ports;
pub mod token_manager;

pub use token_manager::{AuthorizedCallError, TokenManager};
