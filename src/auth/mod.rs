//! Credentials, bearer tokens and the token cache

pub mod authenticator;
pub mod bearer_token_file;
pub mod credentials;
pub mod crypto;
pub mod jwt;
pub mod token_cache;

pub use authenticator::{Authenticator, CredentialAuthenticator};
pub use bearer_token_file::PlainBearerTokenFile;
pub use credentials::{load_credentials, CredentialSet};
pub use token_cache::{EncryptedTokenCache, JwtCache};
