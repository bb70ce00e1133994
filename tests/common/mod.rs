//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use galasactl::auth::{CredentialAuthenticator, EncryptedTokenCache, JwtCache};
use galasactl::platform::{MockEnvironment, MockFileSystem, MockTimeService};

pub const GALASA_HOME: &str = "/home/tester/.galasa";

/// Unsigned JWT with an `exp` claim
pub fn jwt_expiring_at(exp: DateTime<Utc>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let claims = serde_json::json!({ "sub": "tester", "exp": exp.timestamp() });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// In-memory capabilities plus an encrypted cache rooted at the test Galasa home
pub struct TestEnv {
    pub fs: Arc<MockFileSystem>,
    pub env: Arc<MockEnvironment>,
    pub time: Arc<MockTimeService>,
    pub cache: Arc<EncryptedTokenCache>,
}

impl TestEnv {
    pub fn new() -> Self {
        let fs = Arc::new(MockFileSystem::new());
        let env = Arc::new(MockEnvironment::new());
        let time = Arc::new(MockTimeService::default());
        let cache = Arc::new(EncryptedTokenCache::new(
            fs.clone(),
            time.clone(),
            Path::new(GALASA_HOME),
        ));
        Self { fs, env, time, cache }
    }

    pub fn authenticator(&self, api_server_url: &str) -> CredentialAuthenticator {
        self.authenticator_with_cache(api_server_url, self.cache.clone())
    }

    pub fn authenticator_with_cache(
        &self,
        api_server_url: &str,
        cache: Arc<dyn JwtCache>,
    ) -> CredentialAuthenticator {
        CredentialAuthenticator::new(
            api_server_url,
            GALASA_HOME,
            self.fs.clone(),
            self.env.clone(),
            cache,
            reqwest::Client::new(),
        )
    }
}
