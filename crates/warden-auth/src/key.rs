//! Signing key material

use base64::{Engine as _, engine::general_purpose::STANDARD};
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::fmt;

use crate::error::KeyError;

/// Minimum key size for HMAC-SHA-512 (512 bits)
pub const MIN_KEY_BYTES: usize = 64;

/// Symmetric key used both to sign and to verify tokens
///
/// Derived once at startup and shared read-only for the life of the
/// process. Changing the secret invalidates every token issued before.
#[derive(Clone)]
pub struct SigningKey {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    len: usize,
}

impl SigningKey {
    /// Derive a key from a base64-encoded secret
    pub fn from_base64(secret: &str) -> Result<Self, KeyError> {
        let bytes = STANDARD
            .decode(secret.trim())
            .map_err(|_| KeyError::InvalidBase64)?;
        Self::from_bytes(&bytes)
    }

    /// Use raw key bytes directly
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() < MIN_KEY_BYTES {
            return Err(KeyError::TooShort {
                len: bytes.len(),
                min: MIN_KEY_BYTES,
            });
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            len: bytes.len(),
        })
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}
