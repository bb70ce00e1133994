use log::debug;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use super::constants::{self, headers};
use super::models::ErrorResponse;
use crate::error::{GalasaError, Result};

/// Build the shared HTTP client
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(10)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(constants::USER_AGENT)
        .build()
        .map_err(|source| GalasaError::Transport {
            url: String::new(),
            source,
        })
}

/// Send a request, wrapping transport failures with the URL
pub(crate) async fn send(request: RequestBuilder, url: &str) -> Result<Response> {
    request.send().await.map_err(|source| GalasaError::Transport {
        url: url.to_string(),
        source,
    })
}

/// Turn a non-2xx response into a structured error.
///
/// A body in the server's error format yields [`GalasaError::Server`] with the
/// server's message verbatim. Anything else yields [`GalasaError::ResponseFormat`].
pub(crate) async fn check_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    debug!("{} returned {}", url, status);
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(error) => Err(GalasaError::Server {
            status: status.as_u16(),
            url: url.to_string(),
            message: error.error_message,
        }),
        Err(e) => Err(GalasaError::ResponseFormat {
            status: status.as_u16(),
            url: url.to_string(),
            detail: format!("error body could not be parsed ({e}): {}", body.trim()),
        }),
    }
}

/// Deserialize a successful JSON response body
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|source| GalasaError::Transport {
        url: url.to_string(),
        source,
    })?;
    serde_json::from_str(&body).map_err(|e| GalasaError::ResponseFormat {
        status,
        url: url.to_string(),
        detail: e.to_string(),
    })
}

/// A client bound to one API server and one bearer token.
///
/// Cheap to clone. Discarded and rebuilt whenever the token is rejected.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    bearer_token: String,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("bearer_token", &"[REDACTED]")
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
            bearer_token: bearer_token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }

    /// Start a request to an API-relative path with the bearer token attached
    pub fn request(&self, method: Method, path: &str) -> (RequestBuilder, String) {
        let url = constants::endpoint(&self.base_url, path);
        let request = self
            .http
            .request(method, &url)
            .bearer_auth(&self.bearer_token)
            .header(reqwest::header::ACCEPT, headers::CONTENT_TYPE_JSON);
        (request, url)
    }

    /// GET an API-relative path and return the JSON body
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let (request, url) = self.request(Method::GET, path);
        let response = check_status(send(request, &url).await?, &url).await?;
        read_json(response, &url).await
    }

    /// Revoke a personal access token by id
    pub async fn revoke_token(&self, token_id: &str) -> Result<()> {
        let url = constants::token_endpoint(&self.base_url, token_id);
        let request = self
            .http
            .delete(&url)
            .bearer_auth(&self.bearer_token)
            .header(reqwest::header::ACCEPT, headers::CONTENT_TYPE_JSON);

        check_status(send(request, &url).await?, &url).await?;
        debug!("Revoked token {}", token_id);
        Ok(())
    }
}
