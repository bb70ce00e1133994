//! Per-invocation wiring of capabilities, settings and services

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;

use galasactl::api::resilience::config::backoff_from_secs;
use galasactl::api::{build_http_client, AuthenticatedCommsRetrier, CommsRetrier, RetryConfig};
use galasactl::auth::{
    Authenticator, CredentialAuthenticator, EncryptedTokenCache, JwtCache, PlainBearerTokenFile,
};
use galasactl::bootstrap::{resolve_bootstrap, BootstrapData};
use galasactl::config::{galasa_home, Settings, TokenStorage};
use galasactl::platform::{
    Environment, FileSystem, OsEnvironment, OsFileSystem, SystemTimeService, TimeService,
};

use super::app::GlobalArgs;

/// Everything a command needs, built once from the global flags
pub struct CommandContext {
    pub fs: Arc<dyn FileSystem>,
    pub env: Arc<dyn Environment>,
    pub time: Arc<dyn TimeService>,
    pub galasa_home: PathBuf,
    pub settings: Settings,
    pub retry_config: RetryConfig,
    pub http: reqwest::Client,
    bootstrap_path: Option<String>,
}

impl CommandContext {
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let fs: Arc<dyn FileSystem> = Arc::new(OsFileSystem::new());
        let env: Arc<dyn Environment> = Arc::new(OsEnvironment::new());
        let time: Arc<dyn TimeService> = Arc::new(SystemTimeService::new());

        let galasa_home = galasa_home(fs.as_ref(), env.as_ref())
            .context("Failed to locate the Galasa home folder")?;
        let settings = Settings::load(fs.as_ref(), &galasa_home)
            .context("Failed to load galasactl settings")?;

        let mut retry_config = settings
            .retry_config()
            .context("Invalid retry settings")?;
        if let Some(attempts) = args.rate_limit_retries {
            retry_config.max_attempts = attempts.max(1);
        }
        if let Some(seconds) = args.rate_limit_retry_backoff {
            retry_config.backoff = backoff_from_secs(seconds).with_context(|| {
                format!("--rate-limit-retry-backoff {seconds} must be a non-negative, finite number of seconds")
            })?;
        }
        debug!("Retry policy: {:?}", retry_config);

        let http = build_http_client(settings.http_timeout())
            .context("Failed to create HTTP client")?;

        Ok(Self {
            fs,
            env,
            time,
            galasa_home,
            settings,
            retry_config,
            http,
            bootstrap_path: args.bootstrap.clone(),
        })
    }

    pub async fn bootstrap(&self) -> Result<BootstrapData> {
        resolve_bootstrap(
            self.bootstrap_path.as_deref(),
            self.fs.as_ref(),
            self.env.as_ref(),
            &self.http,
        )
        .await
        .context("Failed to resolve the bootstrap")
    }

    pub fn token_cache(&self) -> Arc<dyn JwtCache> {
        match self.settings.tokens.storage {
            TokenStorage::Encrypted => Arc::new(EncryptedTokenCache::new(
                self.fs.clone(),
                self.time.clone(),
                &self.galasa_home,
            )),
            TokenStorage::Plain => Arc::new(PlainBearerTokenFile::new(
                self.fs.clone(),
                self.time.clone(),
                &self.galasa_home,
            )),
        }
    }

    /// Authenticator for an API server URL
    pub fn authenticator_for(&self, api_server_url: &str) -> Arc<dyn Authenticator> {
        Arc::new(CredentialAuthenticator::new(
            api_server_url,
            self.galasa_home.clone(),
            self.fs.clone(),
            self.env.clone(),
            self.token_cache(),
            self.http.clone(),
        ))
    }

    /// Authenticator for the server named by the bootstrap
    pub async fn authenticator(&self) -> Result<Arc<dyn Authenticator>> {
        let bootstrap = self.bootstrap().await?;
        let api_server_url = bootstrap.require_api_server_url()?;
        Ok(self.authenticator_for(api_server_url))
    }

    pub fn retrier(&self) -> CommsRetrier {
        CommsRetrier::new(self.retry_config.clone(), self.time.clone())
    }

    pub fn authenticated_retrier(&self, authenticator: Arc<dyn Authenticator>) -> AuthenticatedCommsRetrier {
        AuthenticatedCommsRetrier::new(self.retrier(), authenticator)
    }
}
