//! Error types for the Galasa communications layer
//!
//! Every failure the auth and retry code can produce is a [`GalasaError`].
//! The retry layer never inspects messages: it asks each error for its
//! [`RetryClass`] instead.

use std::path::PathBuf;
use thiserror::Error;

/// How the retry layer should react to a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Give up and hand the error back to the caller
    Fatal,
    /// The server is throttling us; back off and try again
    RateLimited,
    /// The server rejected our bearer token; log in again and retry
    ReauthRequired,
}

impl RetryClass {
    /// Classify an HTTP status code returned by the API server
    pub fn from_status_code(status: u16) -> Self {
        match status {
            401 | 403 => RetryClass::ReauthRequired,
            429 => RetryClass::RateLimited,
            _ => RetryClass::Fatal,
        }
    }

    pub fn should_retry(&self) -> bool {
        !matches!(self, RetryClass::Fatal)
    }
}

/// Cryptographic failures raised by the token cache cipher
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("cannot derive an encryption key from an empty secret")]
    EmptySecret,

    #[error("ciphertext is {actual} bytes, shorter than the minimum of {minimum}")]
    CiphertextTooShort { actual: usize, minimum: usize },

    #[error("encryption failed")]
    EncryptFailed,

    #[error("ciphertext could not be decrypted with the supplied key")]
    DecryptFailed,

    #[error("decrypted token is not valid UTF-8")]
    NotUtf8,
}

/// Error type for the Galasa communications layer
#[derive(Debug, Error)]
pub enum GalasaError {
    /// Missing or incomplete configuration. Always names the property or path at fault.
    #[error("configuration error in '{property}': {message}")]
    Config { property: String, message: String },

    /// A bootstrap URL that does not end in `/bootstrap`
    #[error("bootstrap URL '{url}' is invalid: it must end with '/bootstrap'")]
    BootstrapUrlInvalid { url: String },

    /// Local file-system failure, wrapped with the path that was being accessed
    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No HTTP response was received
    #[error("request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status
    #[error("server returned HTTP {status} for '{url}': {message}")]
    Server {
        status: u16,
        url: String,
        message: String,
    },

    /// The server answered but the body was not in the expected shape
    #[error("response from '{url}' (HTTP {status}) was not in the expected format: {detail}")]
    ResponseFormat {
        status: u16,
        url: String,
        detail: String,
    },

    #[error("token cache cryptography failed: {0}")]
    Crypto(#[from] CryptoError),

    /// A JWT without a usable expiry claim
    #[error("JWT expiry could not be determined: {0}")]
    Expiry(String),
}

impl GalasaError {
    pub fn config(property: impl Into<String>, message: impl Into<String>) -> Self {
        GalasaError::Config {
            property: property.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GalasaError::Io {
            path: path.into(),
            source,
        }
    }

    /// Decide whether the retry layer should back off, log in again, or give up
    pub fn retry_class(&self) -> RetryClass {
        match self.status() {
            Some(status) => RetryClass::from_status_code(status),
            None => RetryClass::Fatal,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.retry_class() == RetryClass::RateLimited
    }

    pub fn is_auth_error(&self) -> bool {
        self.retry_class() == RetryClass::ReauthRequired
    }

    /// HTTP status reported by the server, if this error came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            GalasaError::Server { status, .. } | GalasaError::ResponseFormat { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Result type for the Galasa communications layer
pub type Result<T> = std::result::Result<T, GalasaError>;
