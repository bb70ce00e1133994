//! Symmetric encryption for cached bearer tokens
//!
//! The key is derived from the credential string itself: SHA-256 of the
//! credential, URL-safe base64 encoded, first 32 bytes. Rotating credentials
//! therefore yields a different key, and tokens cached under the old
//! credentials simply fail to decrypt.
//!
//! Blob layout: `nonce (12 bytes) || AES-256-GCM ciphertext and tag`. A fresh
//! random nonce is drawn for every encryption.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
/// AES block size; also the length of the GCM authentication tag
pub const BLOCK_LEN: usize = 16;

/// Derive the 32-byte cipher key for a credential string
pub fn derive_key(secret: &str) -> Result<[u8; KEY_LEN], CryptoError> {
    if secret.is_empty() {
        return Err(CryptoError::EmptySecret);
    }

    let digest = Sha256::digest(secret.as_bytes());
    let encoded = URL_SAFE.encode(digest);

    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&encoded.as_bytes()[..KEY_LEN]);
    Ok(key)
}

fn cipher_for(secret: &str) -> Result<Aes256Gcm, CryptoError> {
    let key = derive_key(secret)?;
    Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::EncryptFailed)
}

/// Encrypt `plaintext` under a key derived from `secret`
pub fn encrypt(secret: &str, plaintext: &str) -> Result<Vec<u8>, CryptoError> {
    let cipher = cipher_for(secret)?;

    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| CryptoError::EncryptFailed)?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a blob produced by [`encrypt`] with the same secret
pub fn decrypt(secret: &str, blob: &[u8]) -> Result<String, CryptoError> {
    let cipher = cipher_for(secret)?;

    let minimum = NONCE_LEN + BLOCK_LEN;
    if blob.len() < minimum {
        return Err(CryptoError::CiphertextTooShort {
            actual: blob.len(),
            minimum,
        });
    }

    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::DecryptFailed)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::NotUtf8)
}
