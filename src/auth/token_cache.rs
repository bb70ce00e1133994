//! Persistent bearer-token cache
//!
//! One encrypted file per API server. Each entry is encrypted with a key
//! derived from the credential string, so it is only readable by the
//! credentials that wrote it. After a credential change the old entry
//! fails to decrypt, reads as a miss, and is overwritten by the next login.
//!
//! Layout: `<galasa home>/cache/bearer-tokens/<sanitised server url>-<digest>.token`

use log::{debug, info};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{crypto, jwt};
use crate::error::{CryptoError, GalasaError, Result};
use crate::platform::{FileSystem, TimeService};

pub const CACHE_DIR: &str = "cache";
pub const BEARER_TOKENS_DIR: &str = "bearer-tokens";
const TOKEN_FILE_EXTENSION: &str = "token";
const URL_DIGEST_BYTES: usize = 8;

/// Storage for bearer tokens keyed by server URL and credential string
pub trait JwtCache: Send + Sync {
    /// Store `jwt` for this server and credential
    fn put(&self, server_url: &str, credential: &str, jwt: &str) -> Result<()>;

    /// A token that is still usable beyond the expiry buffer, if one is cached.
    /// Absent, unreadable-with-this-credential and nearly-expired entries are all `None`.
    fn get(&self, server_url: &str, credential: &str) -> Result<Option<String>>;

    /// Forget every cached token
    fn clear_all(&self) -> Result<()>;
}

/// Reduce a server URL to a file name stem that is unique per server.
///
/// The readable part drops the scheme and folds punctuation to `_`, so it is
/// followed by a digest of the full URL to keep distinct servers apart.
pub fn sanitize_server_url(server_url: &str) -> String {
    let normalised = server_url.trim_end_matches('/');
    let readable: String = normalised
        .strip_prefix("https://")
        .or_else(|| normalised.strip_prefix("http://"))
        .unwrap_or(normalised)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let digest = Sha256::digest(normalised.as_bytes());
    let suffix: String = digest[..URL_DIGEST_BYTES]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    format!("{readable}-{suffix}")
}

/// Encrypted on-disk token cache
pub struct EncryptedTokenCache {
    fs: Arc<dyn FileSystem>,
    time: Arc<dyn TimeService>,
    cache_dir: PathBuf,
}

impl EncryptedTokenCache {
    pub fn new(fs: Arc<dyn FileSystem>, time: Arc<dyn TimeService>, galasa_home: &Path) -> Self {
        Self {
            fs,
            time,
            cache_dir: galasa_home.join(CACHE_DIR).join(BEARER_TOKENS_DIR),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// One file per server. Whichever credential wrote last owns it; any
    /// other credential fails to decrypt it and sees a miss.
    fn entry_path(&self, server_url: &str) -> PathBuf {
        self.cache_dir.join(format!(
            "{}.{}",
            sanitize_server_url(server_url),
            TOKEN_FILE_EXTENSION
        ))
    }
}

impl JwtCache for EncryptedTokenCache {
    fn put(&self, server_url: &str, credential: &str, jwt: &str) -> Result<()> {
        let blob = crypto::encrypt(credential, jwt)?;
        let path = self.entry_path(server_url);
        self.fs.write_binary_file(&path, &blob)?;
        debug!("Cached bearer token for {} at {:?}", server_url, path);
        Ok(())
    }

    fn get(&self, server_url: &str, credential: &str) -> Result<Option<String>> {
        if credential.is_empty() {
            return Err(CryptoError::EmptySecret.into());
        }

        let path = self.entry_path(server_url);
        if !self.fs.exists(&path) {
            debug!("No cached bearer token for {}", server_url);
            return Ok(None);
        }

        let blob = self.fs.read_binary_file(&path)?;
        let token = match crypto::decrypt(credential, &blob) {
            Ok(token) => token,
            Err(CryptoError::DecryptFailed) | Err(CryptoError::NotUtf8) => {
                debug!("Cached bearer token for {} was not written with these credentials", server_url);
                return Ok(None);
            }
            Err(e) => return Err(GalasaError::Crypto(e)),
        };

        match jwt::is_usable_at(&token, self.time.now()) {
            Ok(true) => {
                debug!("Using cached bearer token for {}", server_url);
                Ok(Some(token))
            }
            Ok(false) => {
                debug!("Cached bearer token for {} expires too soon", server_url);
                Ok(None)
            }
            Err(e) => {
                debug!("Ignoring cached bearer token for {}: {}", server_url, e);
                Ok(None)
            }
        }
    }

    fn clear_all(&self) -> Result<()> {
        self.fs.delete_dir(&self.cache_dir)?;
        info!("Cleared cached bearer tokens");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::tests::{jwt_expiring_at, jwt_with_claims};
    use crate::platform::{MockFileSystem, MockTimeService};
    use chrono::{DateTime, Duration};

    const URL: &str = "https://galasa.example.com/api";

    struct Fixture {
        fs: Arc<MockFileSystem>,
        time: Arc<MockTimeService>,
        cache: EncryptedTokenCache,
    }

    fn fixture() -> Fixture {
        let fs = Arc::new(MockFileSystem::new());
        let time = Arc::new(MockTimeService::new(
            DateTime::from_timestamp(1_800_000_000, 0).unwrap(),
        ));
        let cache = EncryptedTokenCache::new(
            fs.clone(),
            time.clone(),
            Path::new("/home/tester/.galasa"),
        );
        Fixture { fs, time, cache }
    }

    #[test]
    fn test_sanitize_server_url() {
        let name = sanitize_server_url("https://galasa.example.com/api");
        assert!(name.starts_with("galasa.example.com_api-"));
        assert_eq!(name.len(), "galasa.example.com_api-".len() + 16);

        // A trailing slash names the same server
        assert_eq!(
            sanitize_server_url("http://localhost:8080/"),
            sanitize_server_url("http://localhost:8080")
        );
    }

    #[test]
    fn test_similar_urls_get_distinct_names() {
        assert_ne!(
            sanitize_server_url("https://host/api_x"),
            sanitize_server_url("https://host/api/x")
        );
        assert_ne!(
            sanitize_server_url("https://host/api_x"),
            sanitize_server_url("http://host/api_x")
        );
    }

    #[test]
    fn test_put_then_get() {
        let f = fixture();
        let token = jwt_expiring_at(f.time.now() + Duration::hours(8));

        f.cache.put(URL, "abcdef:clientA", &token).unwrap();
        assert_eq!(f.cache.get(URL, "abcdef:clientA").unwrap(), Some(token.clone()));

        // Stored bytes are not the token text
        let paths = f.fs.paths();
        assert_eq!(paths.len(), 1);
        assert_eq!(
            paths[0],
            Path::new("/home/tester/.galasa/cache/bearer-tokens")
                .join(format!("{}.token", sanitize_server_url(URL)))
        );
        let stored = f.fs.read_binary_file(&paths[0]).unwrap();
        assert!(!String::from_utf8_lossy(&stored).contains(&token));
    }

    #[test]
    fn test_other_credentials_see_empty_cache() {
        let f = fixture();
        let token = jwt_expiring_at(f.time.now() + Duration::hours(8));

        f.cache.put(URL, "credA:client", &token).unwrap();
        assert_eq!(f.cache.get(URL, "credB:client").unwrap(), None);
        assert_eq!(f.cache.get(URL, "credA:client").unwrap(), Some(token));
    }

    #[test]
    fn test_rotated_credentials_replace_the_entry() {
        let f = fixture();
        let token_a = jwt_expiring_at(f.time.now() + Duration::hours(1));
        let token_b = jwt_expiring_at(f.time.now() + Duration::hours(2));

        f.cache.put(URL, "credA:client", &token_a).unwrap();
        f.cache.put(URL, "credB:client", &token_b).unwrap();

        assert_eq!(f.fs.paths().len(), 1);
        // The old credentials cannot decrypt the new entry
        assert_eq!(f.cache.get(URL, "credA:client").unwrap(), None);
        assert_eq!(f.cache.get(URL, "credB:client").unwrap(), Some(token_b));
    }

    #[test]
    fn test_servers_do_not_collide() {
        let f = fixture();
        let token = jwt_expiring_at(f.time.now() + Duration::hours(1));

        f.cache.put(URL, "cred:client", &token).unwrap();
        assert_eq!(f.cache.get("https://other.example.com/api", "cred:client").unwrap(), None);
    }

    #[test]
    fn test_lookalike_servers_do_not_share_tokens() {
        let f = fixture();
        let token = jwt_expiring_at(f.time.now() + Duration::hours(1));

        f.cache.put("https://host/api_x", "cred:client", &token).unwrap();

        assert_eq!(f.cache.get("https://host/api/x", "cred:client").unwrap(), None);
        assert_eq!(f.cache.get("http://host/api_x", "cred:client").unwrap(), None);
        assert_eq!(f.cache.get("https://host/api_x", "cred:client").unwrap(), Some(token));
    }

    #[test]
    fn test_expiry_buffer_is_a_miss() {
        let f = fixture();
        let nine = jwt_expiring_at(f.time.now() + Duration::minutes(9));
        let eleven = jwt_expiring_at(f.time.now() + Duration::minutes(11));

        f.cache.put(URL, "cred:client", &nine).unwrap();
        assert_eq!(f.cache.get(URL, "cred:client").unwrap(), None);

        f.cache.put(URL, "cred:client", &eleven).unwrap();
        assert_eq!(f.cache.get(URL, "cred:client").unwrap(), Some(eleven));

        // Two minutes later the eleven-minute token is inside the buffer too
        f.time.advance(std::time::Duration::from_secs(120));
        assert_eq!(f.cache.get(URL, "cred:client").unwrap(), None);
    }

    #[test]
    fn test_token_without_expiry_is_a_miss() {
        let f = fixture();
        let token = jwt_with_claims(&serde_json::json!({ "sub": "tester" }));

        f.cache.put(URL, "cred:client", &token).unwrap();
        assert_eq!(f.cache.get(URL, "cred:client").unwrap(), None);
    }

    #[test]
    fn test_truncated_entry_is_a_crypto_error() {
        let f = fixture();
        let token = jwt_expiring_at(f.time.now() + Duration::hours(1));
        f.cache.put(URL, "cred:client", &token).unwrap();

        let path = f.fs.paths().remove(0);
        f.fs.write_binary_file(&path, &[1, 2, 3]).unwrap();

        let err = f.cache.get(URL, "cred:client").unwrap_err();
        assert!(matches!(err, GalasaError::Crypto(CryptoError::CiphertextTooShort { .. })));
    }

    #[test]
    fn test_empty_credential_is_rejected() {
        let f = fixture();
        assert!(matches!(f.cache.put(URL, "", "t"), Err(GalasaError::Crypto(CryptoError::EmptySecret))));
        assert!(matches!(f.cache.get(URL, ""), Err(GalasaError::Crypto(CryptoError::EmptySecret))));
    }

    #[test]
    fn test_clear_all() {
        let f = fixture();
        let token = jwt_expiring_at(f.time.now() + Duration::hours(1));
        f.fs.write_text_file(Path::new("/home/tester/.galasa/galasactl.properties"), "GALASA_TOKEN=a:b")
            .unwrap();

        f.cache.put(URL, "credA:client", &token).unwrap();
        f.cache.put("http://localhost:8080", "credB:client", &token).unwrap();
        f.cache.clear_all().unwrap();

        assert_eq!(f.cache.get(URL, "credA:client").unwrap(), None);
        assert_eq!(f.cache.get("http://localhost:8080", "credB:client").unwrap(), None);
        // Only the cache is removed
        assert_eq!(
            f.fs.paths(),
            vec![PathBuf::from("/home/tester/.galasa/galasactl.properties")]
        );
    }
}
