//! Media upload state machine

pub mod orchestrator;
pub mod ports;

pub use orchestrator::{MediaSettings, MediaUploadOrchestrator};
