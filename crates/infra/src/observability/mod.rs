//! Observability infrastructure
//!
//! Structured logging setup for hosts embedding the publishing core. The
//! core crates only emit `tracing` events; installing a subscriber is the
//! host's choice and happens here.

pub mod logging;

pub use logging::{build_filter, init_tracing};
