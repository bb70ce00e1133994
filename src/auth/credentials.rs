//! Client credentials from `galasactl.properties` with environment overrides
//!
//! Two styles are accepted. The combined style is a single `GALASA_TOKEN`
//! of the form `<refresh token>:<client id>`. The discrete style sets
//! `GALASA_CLIENT_ID`, `GALASA_SECRET` and `GALASA_ACCESS_TOKEN` separately.
//! Every property can be overridden by an environment variable of the same
//! name, and the environment always wins.

use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{GalasaError, Result};
use crate::platform::{Environment, FileSystem};
use crate::properties::{Properties, parse_properties};

pub const CREDENTIALS_FILE: &str = "galasactl.properties";

pub const GALASA_TOKEN: &str = "GALASA_TOKEN";
pub const GALASA_CLIENT_ID: &str = "GALASA_CLIENT_ID";
pub const GALASA_SECRET: &str = "GALASA_SECRET";
pub const GALASA_ACCESS_TOKEN: &str = "GALASA_ACCESS_TOKEN";

/// Separates the refresh token from the client id in `GALASA_TOKEN`
pub const TOKEN_SEPARATOR: &str = ":";

/// The credentials presented to the token endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSet {
    pub client_id: String,
    /// Empty when the combined token style is used
    pub secret: String,
    pub refresh_token: String,
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("client_id", &self.client_id)
            .field("secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

pub fn credentials_path(galasa_home: &Path) -> PathBuf {
    galasa_home.join(CREDENTIALS_FILE)
}

/// Load and validate credentials.
///
/// Returns the credential set and the raw credential string. The raw string
/// identifies the credentials in the token cache and keys its encryption.
pub fn load_credentials(
    fs: &dyn FileSystem,
    galasa_home: &Path,
    env: &dyn Environment,
) -> Result<(CredentialSet, String)> {
    let path = credentials_path(galasa_home);

    let file_properties = if fs.exists(&path) {
        debug!("Reading credentials from {:?}", path);
        parse_properties(&fs.read_text_file(&path)?)
    } else {
        debug!("No credentials file at {:?}, relying on environment", path);
        Properties::new()
    };

    let lookup = |name: &str| -> Option<String> {
        env.get_env(name).or_else(|| {
            file_properties
                .get(name)
                .filter(|value| !value.is_empty())
                .cloned()
        })
    };

    match lookup(GALASA_TOKEN) {
        Some(token) => {
            let credentials = parse_galasa_token(&token)?;
            info!("Loaded credentials for client '{}'", credentials.client_id);
            Ok((credentials, token))
        }
        None => {
            let require = |name: &str| -> Result<String> {
                lookup(name).ok_or_else(|| {
                    GalasaError::config(
                        name,
                        format!(
                            "not set in {} or the environment (or set {} instead)",
                            path.display(),
                            GALASA_TOKEN
                        ),
                    )
                })
            };

            let credentials = CredentialSet {
                client_id: require(GALASA_CLIENT_ID)?,
                secret: require(GALASA_SECRET)?,
                refresh_token: require(GALASA_ACCESS_TOKEN)?,
            };
            let raw = [
                credentials.refresh_token.as_str(),
                credentials.client_id.as_str(),
                credentials.secret.as_str(),
            ]
            .join(TOKEN_SEPARATOR);

            info!("Loaded credentials for client '{}'", credentials.client_id);
            Ok((credentials, raw))
        }
    }
}

/// Split a combined `refreshToken:clientId` string
pub fn parse_galasa_token(token: &str) -> Result<CredentialSet> {
    let parts: Vec<&str> = token.split(TOKEN_SEPARATOR).collect();

    match parts.as_slice() {
        [_] => Err(GalasaError::config(
            GALASA_TOKEN,
            format!("missing the '{TOKEN_SEPARATOR}' separator between refresh token and client id"),
        )),
        [refresh_token, client_id] => {
            if refresh_token.trim().is_empty() {
                return Err(GalasaError::config(GALASA_TOKEN, "refresh token part is empty"));
            }
            if client_id.trim().is_empty() {
                return Err(GalasaError::config(GALASA_TOKEN, "client id part is empty"));
            }
            Ok(CredentialSet {
                client_id: client_id.trim().to_string(),
                secret: String::new(),
                refresh_token: refresh_token.trim().to_string(),
            })
        }
        _ => Err(GalasaError::config(
            GALASA_TOKEN,
            format!(
                "expected exactly two parts separated by '{TOKEN_SEPARATOR}', found {}",
                parts.len()
            ),
        )),
    }
}
