//! Authenticated communications for the Galasa command-line client
//!
//! Resolves the API server from the bootstrap, trades local credentials for
//! short-lived bearer tokens, caches them encrypted on disk, and retries
//! remote calls through rate limiting and token expiry.

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod platform;
pub mod properties;

pub use error::{CryptoError, GalasaError, Result, RetryClass};
