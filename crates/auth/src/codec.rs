//! HS256 token signing and verification.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, Header, Validation, errors::ErrorKind};
use thiserror::Error;

use crate::claims::WireClaims;
use crate::{AuthenticatedIdentity, InvalidTokenReason, Role, SigningKey, TokenClaims, validate_claims};

/// Default token lifetime (one hour).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Verification failure.
///
/// Callers get one opaque kind. The underlying [`InvalidTokenReason`] is
/// available for logs and must not be echoed to clients.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid or expired token")]
pub struct InvalidToken(InvalidTokenReason);

impl InvalidToken {
    pub fn reason(&self) -> InvalidTokenReason {
        self.0
    }
}

impl From<InvalidTokenReason> for InvalidToken {
    fn from(reason: InvalidTokenReason) -> Self {
        Self(reason)
    }
}

#[derive(Debug, Error)]
pub enum SignError {
    #[error("failed to sign token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),

    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
}

/// Signs and verifies compact HS256 tokens carrying a subject and a role.
///
/// Holds nothing but the shared immutable key and the issuance TTL, so a single
/// instance can serve any number of concurrent callers.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    key: Arc<SigningKey>,
    ttl: Duration,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(key: Arc<SigningKey>, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks run in `validate_claims` against an explicit `now`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            key,
            ttl,
            validation,
        }
    }

    pub fn with_default_ttl(key: Arc<SigningKey>) -> Self {
        Self::new(key, Duration::seconds(DEFAULT_TOKEN_TTL_SECS))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign `{sub, role, iat: now, exp: now + ttl}`.
    pub fn sign(
        &self,
        subject: &str,
        role: &Role,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, SignError> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or(SignError::ExpiryOutOfRange)?;

        let claims = WireClaims {
            sub: Some(subject.to_string()),
            role: Some(role.as_str().to_string()),
            iat: Some(now.timestamp()),
            exp: Some(expires_at.timestamp()),
        };

        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            self.key.encoding(),
        )?)
    }

    /// Issue a token valid from now for the configured TTL.
    pub fn issue(&self, subject: &str, role: &Role) -> Result<String, SignError> {
        self.sign(subject, role, Utc::now(), self.ttl)
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, InvalidToken> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, InvalidToken> {
        let data = jsonwebtoken::decode::<WireClaims>(token, self.key.decoding(), &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::InvalidSignature => InvalidTokenReason::BadSignature,
                _ => InvalidTokenReason::Malformed,
            })?;

        let claims = data.claims.into_claims()?;
        validate_claims(&claims, now)?;
        Ok(claims)
    }

    pub fn verify_identity(&self, token: &str) -> Result<AuthenticatedIdentity, InvalidToken> {
        self.verify(token).map(AuthenticatedIdentity::from)
    }
}
