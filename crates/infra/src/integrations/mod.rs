//! External service integrations

pub mod linkedin;
