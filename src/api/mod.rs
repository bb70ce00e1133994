//! Galasa API server access
//!
//! An authenticated client handle, token exchange payloads and the retry
//! layer that wraps every remote call.

pub mod client;
pub mod constants;
pub mod models;
pub mod resilience;

pub use client::{build_http_client, ApiClient};
pub use models::{ErrorResponse, TokenRequest, TokenResponse};
pub use resilience::{AuthenticatedCommsRetrier, CommsRetrier, RetryConfig};
