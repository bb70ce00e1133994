use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::resilience::config::backoff_from_secs;
use crate::api::resilience::RetryConfig;
use crate::error::{GalasaError, Result};
use crate::platform::{Environment, FileSystem};

/// Environment variable that relocates the Galasa home folder
pub const GALASA_HOME_ENV: &str = "GALASA_HOME";

/// Name of the Galasa home folder under the user's home directory
pub const GALASA_HOME_DIR: &str = ".galasa";

/// Optional settings file inside Galasa home
pub const SETTINGS_FILE: &str = "galasactl.toml";

/// Resolve the Galasa home folder: `$GALASA_HOME`, else `~/.galasa`
pub fn galasa_home(fs: &dyn FileSystem, env: &dyn Environment) -> Result<PathBuf> {
    match env.get_env(GALASA_HOME_ENV) {
        Some(home) => {
            debug!("Using {} from environment: {}", GALASA_HOME_ENV, home);
            expand_home(fs, &home)
        }
        None => Ok(fs.user_home_dir()?.join(GALASA_HOME_DIR)),
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(fs: &dyn FileSystem, path: &str) -> Result<PathBuf> {
    if path == "~" {
        return fs.user_home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => Ok(fs.user_home_dir()?.join(rest)),
        None => Ok(PathBuf::from(path)),
    }
}

/// Where bearer tokens are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// One encrypted file per server and credential
    #[default]
    Encrypted,
    /// A single plain `bearer-token.json` file
    Plain,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub tokens: TokenSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_seconds")]
    pub backoff_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TokenSettings {
    #[serde(default)]
    pub storage: TokenStorage,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_seconds() -> f64 {
    1.0
}

fn default_timeout_seconds() -> u64 {
    30
}

impl RetrySettings {
    /// The backoff as a duration; rejects negative, non-finite and overflowing values
    pub fn backoff(&self) -> Result<Duration> {
        backoff_from_secs(self.backoff_seconds).ok_or_else(|| {
            GalasaError::config(
                "retry.backoff_seconds",
                format!(
                    "{} is not a usable number of seconds (must be non-negative and finite)",
                    self.backoff_seconds
                ),
            )
        })
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_seconds: default_backoff_seconds(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Settings {
    pub fn settings_path(galasa_home: &Path) -> PathBuf {
        galasa_home.join(SETTINGS_FILE)
    }

    /// Load settings from Galasa home, falling back to defaults when the file is absent
    pub fn load(fs: &dyn FileSystem, galasa_home: &Path) -> Result<Self> {
        let path = Self::settings_path(galasa_home);
        debug!("Loading settings from: {:?}", path);

        if !fs.exists(&path) {
            info!("Settings file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let content = fs.read_text_file(&path)?;
        Self::parse(&content, &path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        let settings: Settings = toml::from_str(content).map_err(|e| {
            GalasaError::config(path.display().to_string(), format!("failed to parse settings: {e}"))
        })?;

        if settings.retry.max_attempts == 0 {
            return Err(GalasaError::config("retry.max_attempts", "must be at least 1"));
        }
        settings.retry.backoff()?;

        debug!(
            "Loaded settings: {} attempts, {}s backoff, {:?} token storage",
            settings.retry.max_attempts, settings.retry.backoff_seconds, settings.tokens.storage
        );
        Ok(settings)
    }

    pub fn retry_config(&self) -> Result<RetryConfig> {
        Ok(RetryConfig::builder()
            .max_attempts(self.retry.max_attempts)
            .backoff(self.retry.backoff()?)
            .build())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }
}
