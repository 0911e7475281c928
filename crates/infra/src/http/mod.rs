//! HTTP transport shared by every platform integration
//!
//! Provides a reqwest client wrapper that owns the retry schedule and the
//! per-attempt timeout so integrations only build requests and read
//! responses.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
