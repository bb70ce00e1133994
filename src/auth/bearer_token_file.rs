//! Unencrypted single-token storage
//!
//! Writes the most recent bearer token to `<galasa home>/bearer-token.json`
//! as `{"jwt": "<token>"}`. There is one slot only: server URL and credential
//! are ignored when storing. Reads still apply the expiry buffer.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::jwt;
use super::token_cache::JwtCache;
use crate::error::{GalasaError, Result};
use crate::platform::{FileSystem, TimeService};

pub const BEARER_TOKEN_FILE: &str = "bearer-token.json";

#[derive(Debug, Serialize, Deserialize)]
struct BearerTokenJson {
    jwt: String,
}

pub struct PlainBearerTokenFile {
    fs: Arc<dyn FileSystem>,
    time: Arc<dyn TimeService>,
    path: PathBuf,
}

impl PlainBearerTokenFile {
    pub fn new(fs: Arc<dyn FileSystem>, time: Arc<dyn TimeService>, galasa_home: &Path) -> Self {
        Self {
            fs,
            time,
            path: galasa_home.join(BEARER_TOKEN_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JwtCache for PlainBearerTokenFile {
    fn put(&self, _server_url: &str, _credential: &str, jwt: &str) -> Result<()> {
        let json = serde_json::to_string(&BearerTokenJson {
            jwt: jwt.to_string(),
        })
        .map_err(|e| GalasaError::config(self.path.display().to_string(), e.to_string()))?;

        self.fs.write_text_file(&self.path, &json)?;
        debug!("Wrote bearer token to {:?}", self.path);
        Ok(())
    }

    fn get(&self, _server_url: &str, _credential: &str) -> Result<Option<String>> {
        if !self.fs.exists(&self.path) {
            return Ok(None);
        }

        let content = self.fs.read_text_file(&self.path)?;
        let stored: BearerTokenJson = serde_json::from_str(&content).map_err(|e| {
            GalasaError::config(
                self.path.display().to_string(),
                format!("not a valid bearer token file: {e}"),
            )
        })?;

        match jwt::is_usable_at(&stored.jwt, self.time.now()) {
            Ok(true) => Ok(Some(stored.jwt)),
            Ok(false) => {
                debug!("Bearer token in {:?} expires too soon", self.path);
                Ok(None)
            }
            Err(e) => {
                debug!("Ignoring bearer token in {:?}: {}", self.path, e);
                Ok(None)
            }
        }
    }

    fn clear_all(&self) -> Result<()> {
        self.fs.delete_file(&self.path)?;
        info!("Deleted bearer token file {:?}", self.path);
        Ok(())
    }
}
