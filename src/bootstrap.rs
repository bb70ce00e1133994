//! Bootstrap resolution: which API server this invocation talks to
//!
//! The bootstrap location comes from, in order of priority, an explicit
//! path, the `GALASA_BOOTSTRAP` environment variable, or
//! `bootstrap.properties` in Galasa home. A remote bootstrap is a URL ending
//! in `/bootstrap`; the API server lives at the URL with that suffix removed.
//! Either way, a `framework.api.server.url` property overrides the server URL.

use log::{debug, info};
use std::path::PathBuf;

use crate::config::{expand_home, galasa_home};
use crate::error::{GalasaError, Result};
use crate::platform::{Environment, FileSystem};
use crate::properties::{Properties, parse_properties};

pub const BOOTSTRAP_ENV: &str = "GALASA_BOOTSTRAP";
pub const DEFAULT_BOOTSTRAP_FILE: &str = "bootstrap.properties";
pub const BOOTSTRAP_URL_SUFFIX: &str = "/bootstrap";
pub const API_SERVER_URL_PROPERTY: &str = "framework.api.server.url";

/// Resolved bootstrap for one command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapData {
    /// The location the properties were loaded from
    pub path: String,
    /// Base URL of the API server. Empty when a local bootstrap names no server.
    pub api_server_url: String,
    pub properties: Properties,
}

impl BootstrapData {
    /// The API server URL, or a configuration error naming the missing property
    pub fn require_api_server_url(&self) -> Result<&str> {
        if self.api_server_url.is_empty() {
            return Err(GalasaError::config(
                API_SERVER_URL_PROPERTY,
                format!("bootstrap '{}' does not name an API server", self.path),
            ));
        }
        Ok(&self.api_server_url)
    }
}

fn is_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Strip the `/bootstrap` suffix from a bootstrap URL
pub fn api_server_url_from_bootstrap_url(url: &str) -> Result<String> {
    url.strip_suffix(BOOTSTRAP_URL_SUFFIX)
        .map(str::to_string)
        .ok_or_else(|| GalasaError::BootstrapUrlInvalid {
            url: url.to_string(),
        })
}

/// Resolve the bootstrap for this invocation
pub async fn resolve_bootstrap(
    explicit_path: Option<&str>,
    fs: &dyn FileSystem,
    env: &dyn Environment,
    http: &reqwest::Client,
) -> Result<BootstrapData> {
    let explicit = explicit_path.map(str::trim).filter(|p| !p.is_empty());
    let from_env = env
        .get_env(BOOTSTRAP_ENV)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let (path, is_default) = match (explicit, from_env) {
        (Some(path), _) => {
            debug!("Using bootstrap from command line: {}", path);
            (path.to_string(), false)
        }
        (None, Some(path)) => {
            debug!("Using bootstrap from {}: {}", BOOTSTRAP_ENV, path);
            (path, false)
        }
        (None, None) => {
            let default_path = galasa_home(fs, env)?.join(DEFAULT_BOOTSTRAP_FILE);
            debug!("Using default bootstrap: {:?}", default_path);
            (default_path.display().to_string(), true)
        }
    };

    let bootstrap = if is_url(&path) {
        load_remote(&path, http).await?
    } else {
        load_local(&path, is_default, fs)?
    };

    info!(
        "Resolved bootstrap '{}' to API server '{}'",
        bootstrap.path, bootstrap.api_server_url
    );
    Ok(bootstrap)
}

async fn load_remote(url: &str, http: &reqwest::Client) -> Result<BootstrapData> {
    // Validate before going anywhere near the network
    let mut api_server_url = api_server_url_from_bootstrap_url(url)?;

    debug!("Fetching bootstrap properties from {}", url);
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|source| GalasaError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|source| GalasaError::Transport {
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        return Err(GalasaError::Server {
            status: status.as_u16(),
            url: url.to_string(),
            message: format!("failed to fetch bootstrap: {}", body.trim()),
        });
    }

    let properties = parse_properties(&body);
    if let Some(overridden) = properties.get(API_SERVER_URL_PROPERTY) {
        api_server_url = overridden.clone();
    }

    Ok(BootstrapData {
        path: url.to_string(),
        api_server_url,
        properties,
    })
}

fn load_local(path: &str, is_default: bool, fs: &dyn FileSystem) -> Result<BootstrapData> {
    let stripped = path
        .strip_prefix("file://")
        .or_else(|| path.strip_prefix("file:"))
        .unwrap_or(path);
    let file_path: PathBuf = expand_home(fs, stripped)?;

    let properties = if is_default && !fs.exists(&file_path) {
        debug!("No default bootstrap file at {:?}, using an empty bootstrap", file_path);
        Properties::new()
    } else {
        parse_properties(&fs.read_text_file(&file_path)?)
    };

    let api_server_url = properties
        .get(API_SERVER_URL_PROPERTY)
        .cloned()
        .unwrap_or_default();

    Ok(BootstrapData {
        path: file_path.display().to_string(),
        api_server_url,
        properties,
    })
}
