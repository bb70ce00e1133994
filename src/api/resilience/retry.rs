//! Retrying remote calls through rate limiting and token expiry
//!
//! [`CommsRetrier`] retries plain operations that were rate limited.
//! [`AuthenticatedCommsRetrier`] additionally holds an [`ApiClient`] and
//! rebuilds it after the server rejects its bearer token.

use std::future::Future;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::Mutex;

use super::config::RetryConfig;
use crate::api::client::ApiClient;
use crate::auth::Authenticator;
use crate::error::{GalasaError, Result, RetryClass};
use crate::platform::TimeService;

/// Fixed-backoff retry loop for operations with no authentication concern
#[derive(Clone)]
pub struct CommsRetrier {
    config: RetryConfig,
    time: Arc<dyn TimeService>,
}

impl CommsRetrier {
    pub fn new(config: RetryConfig, time: Arc<dyn TimeService>) -> Self {
        Self { config, time }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails fatally, or attempts run out.
    ///
    /// Only rate limiting is retried here. The last error is returned as is.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            let error = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("Operation succeeded after {} attempts", attempt);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if error.retry_class() != RetryClass::RateLimited {
                debug!("Operation failed on attempt {} (not retryable): {}", attempt, error);
                return Err(error);
            }

            if !self.back_off(attempt, &error).await {
                return Err(error);
            }
            attempt += 1;
        }
    }

    /// Sleep before the next attempt. Returns false once attempts are exhausted.
    async fn back_off(&self, attempt: u32, error: &GalasaError) -> bool {
        let max_attempts = self.config.max_attempts.max(1);
        if attempt >= max_attempts {
            warn!(
                "Operation failed permanently after {} attempts: {}",
                attempt, error
            );
            return false;
        }

        warn!(
            "Attempt {}/{} failed (retryable): {}",
            attempt, max_attempts, error
        );
        debug!("Waiting {:?} before retry", self.config.backoff);
        self.time.sleep(self.config.backoff).await;
        true
    }
}

#[derive(Default)]
struct ClientState {
    client: Option<ApiClient>,
    login_required: bool,
}

/// Retry loop for operations that call through an authenticated client.
///
/// The held client survives between `execute` calls and is only rebuilt
/// after the server reports an authentication failure.
pub struct AuthenticatedCommsRetrier {
    retrier: CommsRetrier,
    authenticator: Arc<dyn Authenticator>,
    state: Mutex<ClientState>,
}

impl AuthenticatedCommsRetrier {
    pub fn new(retrier: CommsRetrier, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            retrier,
            authenticator,
            state: Mutex::new(ClientState::default()),
        }
    }

    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }

    /// Run `operation` with an authenticated client.
    ///
    /// Each attempt acquires at most one client. A failed acquisition is
    /// retried only when it was rate limited; any other acquisition failure
    /// ends the loop.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut(ApiClient) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            let (result, acquiring) = match self.acquire_client().await {
                Ok(client) => (operation(client).await, false),
                Err(error) => (Err(error), true),
            };

            let error = match result {
                Ok(value) => {
                    if attempt > 1 {
                        info!("Operation succeeded after {} attempts", attempt);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let retry = match error.retry_class() {
                RetryClass::RateLimited => true,
                RetryClass::ReauthRequired if !acquiring => {
                    info!("Server rejected the bearer token, logging in again");
                    self.invalidate_client().await;
                    true
                }
                _ => false,
            };

            if !retry {
                debug!("Operation failed on attempt {} (not retryable): {}", attempt, error);
                return Err(error);
            }

            if !self.retrier.back_off(attempt, &error).await {
                return Err(error);
            }
            attempt += 1;
        }
    }

    /// Drop the held client so the next attempt logs in afresh
    pub async fn invalidate_client(&self) {
        let mut state = self.state.lock().await;
        state.client = None;
        state.login_required = true;
    }

    async fn acquire_client(&self) -> Result<ApiClient> {
        let mut state = self.state.lock().await;
        if let Some(client) = &state.client {
            return Ok(client.clone());
        }

        if state.login_required {
            self.authenticator.login().await?;
            state.login_required = false;
        }

        let client = self.authenticator.get_authenticated_api_client().await?;
        debug!("Acquired API client for {}", client.base_url());
        state.client = Some(client.clone());
        Ok(client)
    }
}
