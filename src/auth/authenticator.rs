//! Bearer token acquisition
//!
//! Credentials are re-read from disk and environment on every call. A token
//! is served from the [`JwtCache`] when possible; otherwise the credentials
//! are exchanged for a new one at the server's token endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};

use super::credentials::{load_credentials, CredentialSet};
use super::jwt;
use super::token_cache::JwtCache;
use crate::api::client::{check_status, read_json, send, ApiClient};
use crate::api::constants::{self, headers};
use crate::api::models::{TokenRequest, TokenResponse};
use crate::error::{GalasaError, Result};
use crate::platform::{Environment, FileSystem};

/// Source of bearer tokens and authenticated clients
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// A bearer token that is valid for at least the expiry buffer
    async fn get_bearer_token(&self) -> Result<String>;

    /// Exchange the credentials for a fresh token and cache it
    async fn login(&self) -> Result<()>;

    async fn get_authenticated_api_client(&self) -> Result<ApiClient>;

    /// Forget every cached token
    async fn logout_of_everywhere(&self) -> Result<()>;
}

/// Authenticator backed by local credentials and the token endpoint
pub struct CredentialAuthenticator {
    api_server_url: String,
    galasa_home: PathBuf,
    fs: Arc<dyn FileSystem>,
    env: Arc<dyn Environment>,
    cache: Arc<dyn JwtCache>,
    http: reqwest::Client,
}

impl CredentialAuthenticator {
    pub fn new(
        api_server_url: impl Into<String>,
        galasa_home: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        env: Arc<dyn Environment>,
        cache: Arc<dyn JwtCache>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            api_server_url: api_server_url.into(),
            galasa_home: galasa_home.into(),
            fs,
            env,
            cache,
            http,
        }
    }

    pub fn api_server_url(&self) -> &str {
        &self.api_server_url
    }

    fn credentials(&self) -> Result<(CredentialSet, String)> {
        load_credentials(self.fs.as_ref(), &self.galasa_home, self.env.as_ref())
    }

    async fn request_token(&self, credentials: &CredentialSet) -> Result<TokenResponse> {
        let url = constants::tokens_endpoint(&self.api_server_url);
        let body = TokenRequest {
            client_id: credentials.client_id.clone(),
            refresh_token: credentials.refresh_token.clone(),
            secret: credentials.secret.clone(),
        };

        info!("Requesting a bearer token from {} for client '{}'", url, credentials.client_id);
        let request = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, headers::CONTENT_TYPE_JSON)
            .json(&body);

        let response = check_status(send(request, &url).await?, &url).await?;
        read_json(response, &url).await
    }
}

#[async_trait]
impl Authenticator for CredentialAuthenticator {
    async fn get_bearer_token(&self) -> Result<String> {
        let (_, raw) = self.credentials()?;

        if let Some(token) = self.cache.get(&self.api_server_url, &raw)? {
            return Ok(token);
        }

        self.login().await?;

        self.cache.get(&self.api_server_url, &raw)?.ok_or_else(|| {
            GalasaError::Expiry(format!(
                "the token issued by {} expires within {} minutes and cannot be used",
                self.api_server_url,
                jwt::EXPIRY_BUFFER_MINUTES
            ))
        })
    }

    async fn login(&self) -> Result<()> {
        let (credentials, raw) = self.credentials()?;
        let response = self.request_token(&credentials).await?;

        let expires_at = jwt::expiry(&response.jwt).map_err(|e| {
            GalasaError::Expiry(format!("server issued an unusable token: {e}"))
        })?;
        debug!(
            "Issued token expires at {}; refresh token {}",
            expires_at,
            if response.refresh_token.is_some() { "returned" } else { "not returned" }
        );

        self.cache.put(&self.api_server_url, &raw, &response.jwt)?;
        info!("Logged in to {}", self.api_server_url);
        Ok(())
    }

    async fn get_authenticated_api_client(&self) -> Result<ApiClient> {
        let token = self.get_bearer_token().await?;
        Ok(ApiClient::new(self.api_server_url.clone(), token, self.http.clone()))
    }

    async fn logout_of_everywhere(&self) -> Result<()> {
        self.cache.clear_all()?;
        info!("Logged out of all Galasa servers");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::GALASA_TOKEN;
    use crate::auth::jwt::tests::{jwt_expiring_at, jwt_with_claims};
    use crate::auth::token_cache::EncryptedTokenCache;
    use crate::platform::{MockEnvironment, MockFileSystem, MockTimeService, TimeService};
    use chrono::Duration;
    use std::path::Path;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HOME: &str = "/home/tester/.galasa";

    struct Fixture {
        fs: Arc<MockFileSystem>,
        env: Arc<MockEnvironment>,
        time: Arc<MockTimeService>,
        auth: CredentialAuthenticator,
    }

    fn fixture(server: &MockServer) -> Fixture {
        let fs = Arc::new(MockFileSystem::new());
        let env = Arc::new(MockEnvironment::new());
        let time = Arc::new(MockTimeService::default());
        let cache = Arc::new(EncryptedTokenCache::new(fs.clone(), time.clone(), Path::new(HOME)));
        let auth = CredentialAuthenticator::new(
            server.uri(),
            HOME,
            fs.clone(),
            env.clone(),
            cache,
            reqwest::Client::new(),
        );
        Fixture { fs, env, time, auth }
    }

    #[tokio::test]
    async fn test_login_posts_combined_token_and_caches_result() {
        let server = MockServer::start().await;
        let f = fixture(&server);
        f.env.set_env(GALASA_TOKEN, "abcdef:clientA");
        let token = jwt_expiring_at(f.time.now() + Duration::hours(2));

        Mock::given(method("POST"))
            .and(path("/auth/tokens"))
            .and(body_json(serde_json::json!({
                "client_id": "clientA",
                "refresh_token": "abcdef"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "jwt": token,
                "refresh_token": "new-refresh"
            })))
            .expect(1)
            .mount(&server)
            .await;

        f.auth.get_bearer_token().await.unwrap();
        assert_eq!(f.auth.get_bearer_token().await.unwrap(), token);
    }

    #[tokio::test]
    async fn test_cached_token_skips_network() {
        let server = MockServer::start().await;
        let f = fixture(&server);
        f.env.set_env(GALASA_TOKEN, "abcdef:clientA");
        let token = jwt_expiring_at(f.time.now() + Duration::hours(2));

        let cache = EncryptedTokenCache::new(f.fs.clone(), f.time.clone(), Path::new(HOME));
        cache.put(&server.uri(), "abcdef:clientA", &token).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let client = f.auth.get_authenticated_api_client().await.unwrap();
        assert_eq!(client.bearer_token(), token);
        assert_eq!(client.base_url(), server.uri());
    }

    #[tokio::test]
    async fn test_login_failure_is_surfaced() {
        let server = MockServer::start().await;
        let f = fixture(&server);
        f.env.set_env(GALASA_TOKEN, "abcdef:clientA");

        Mock::given(method("POST"))
            .and(path("/auth/tokens"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error_code": 5403,
                "error_message": "GAL5403E: refresh token rejected"
            })))
            .mount(&server)
            .await;

        let err = f.auth.get_bearer_token().await.unwrap_err();
        assert!(err.is_auth_error());
        assert!(err.to_string().contains("GAL5403E: refresh token rejected"));
    }

    #[tokio::test]
    async fn test_issued_token_without_expiry_is_rejected() {
        let server = MockServer::start().await;
        let f = fixture(&server);
        f.env.set_env(GALASA_TOKEN, "abcdef:clientA");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jwt": jwt_with_claims(&serde_json::json!({ "sub": "tester" }))
            })))
            .mount(&server)
            .await;

        let err = f.auth.login().await.unwrap_err();
        assert!(matches!(err, GalasaError::Expiry(_)));
        assert!(f.fs.paths().is_empty());
    }

    #[tokio::test]
    async fn test_short_lived_token_cannot_be_used() {
        let server = MockServer::start().await;
        let f = fixture(&server);
        f.env.set_env(GALASA_TOKEN, "abcdef:clientA");
        let token = jwt_expiring_at(f.time.now() + Duration::minutes(5));

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "jwt": token })))
            .expect(1)
            .mount(&server)
            .await;

        let err = f.auth.get_bearer_token().await.unwrap_err();
        assert!(matches!(err, GalasaError::Expiry(_)));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_network() {
        let server = MockServer::start().await;
        let f = fixture(&server);

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = f.auth.get_bearer_token().await.unwrap_err();
        assert!(matches!(err, GalasaError::Config { .. }));
    }

    #[tokio::test]
    async fn test_logout_clears_cache() {
        let server = MockServer::start().await;
        let f = fixture(&server);
        f.env.set_env(GALASA_TOKEN, "abcdef:clientA");
        let token = jwt_expiring_at(f.time.now() + Duration::hours(2));

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "jwt": token })))
            .expect(2)
            .mount(&server)
            .await;

        f.auth.login().await.unwrap();
        assert!(!f.fs.paths().is_empty());

        f.auth.logout_of_everywhere().await.unwrap();
        assert!(f.fs.paths().is_empty());

        // next request has to log in again
        f.auth.get_bearer_token().await.unwrap();
    }
}
