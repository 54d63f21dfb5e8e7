//! HMAC request signing shared between a ferry master and its remote nodes
//!
//! A signature token has the form `{base64url(hmac_sha256(content:expires))}:{expires}`
//! where `expires` is a unix timestamp in seconds.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::traits::{StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies time-bound tokens with a shared secret
#[derive(Clone)]
pub struct HmacSigner {
    secret: Vec<u8>,
}

impl HmacSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self, content: &str, expires: i64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| StorageError::ConfigError(format!("Invalid signing secret: {}", e)))?;
        mac.update(format!("{}:{}", content, expires).as_bytes());
        Ok(mac)
    }

    /// Sign `content` so that the token expires at the given unix timestamp.
    pub fn sign(&self, content: &str, expires: i64) -> StorageResult<String> {
        let signature = self.mac(content, expires)?.finalize().into_bytes();
        Ok(format!("{}:{}", URL_SAFE_NO_PAD.encode(signature), expires))
    }

    /// Verify a token produced by `sign` for the same `content`.
    pub fn verify(&self, content: &str, token: &str) -> StorageResult<()> {
        let (signature, expires) = token
            .rsplit_once(':')
            .ok_or_else(|| StorageError::InvalidKey("Malformed signature token".to_string()))?;
        let expires: i64 = expires
            .parse()
            .map_err(|_| StorageError::InvalidKey("Malformed signature expiry".to_string()))?;

        if expires < Utc::now().timestamp() {
            return Err(StorageError::InvalidKey("Signature expired".to_string()));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| StorageError::InvalidKey("Malformed signature".to_string()))?;

        self.mac(content, expires)?
            .verify_slice(&signature)
            .map_err(|_| StorageError::InvalidKey("Signature mismatch".to_string()))
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner").finish_non_exhaustive()
    }
}
