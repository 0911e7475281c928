//! Post publishing

pub mod ports;
pub mod service;

pub use service::PostPublisher;
