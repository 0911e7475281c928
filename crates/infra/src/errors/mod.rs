//! Infrastructure error mapping

pub mod conversions;

pub use conversions::{platform_error_for_status, transport_error, InfraError};
