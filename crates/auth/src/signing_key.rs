use jsonwebtoken::{DecodingKey, EncodingKey};
use thiserror::Error;

/// Minimum accepted secret length, in bytes (256 bits for HMAC-SHA256).
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("signing secret must be at least {MIN_SECRET_LEN} bytes (got {actual})")]
pub struct WeakSigningKey {
    pub actual: usize,
}

/// Symmetric HMAC-SHA256 key derived from the shared secret.
///
/// Built once at startup and shared (`Arc`) by every codec that needs it.
/// There is deliberately no way to build one from a short secret.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    pub fn from_secret(secret: impl AsRef<[u8]>) -> Result<Self, WeakSigningKey> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_LEN {
            return Err(WeakSigningKey {
                actual: secret.len(),
            });
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl core::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}
