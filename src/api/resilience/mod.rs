//! Retry policies for Galasa API calls
//!
//! Recovers from rate limiting and rejected bearer tokens with a bounded,
//! fixed-backoff retry loop.

pub mod config;
pub mod retry;

pub use config::{RetryConfig, RetryConfigBuilder};
pub use retry::{AuthenticatedCommsRetrier, CommsRetrier};
