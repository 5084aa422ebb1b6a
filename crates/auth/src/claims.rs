use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Role;

/// Verified token claims.
///
/// A value of this type only exists for a token whose signature checked out
/// and whose `sub`, `role` and `exp` were present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject / identity (typically an email address).
    pub sub: String,

    pub role: Role,

    /// Issued-at timestamp. Tokens from other issuers may omit it.
    pub issued_at: Option<DateTime<Utc>>,

    pub expires_at: DateTime<Utc>,
}

/// JWT payload as it appears on the wire (NumericDate seconds).
///
/// Every field is optional so that a structurally valid token with missing
/// claims is reported as such instead of as a decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct WireClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Internal reason a token was refused.
///
/// Only ever logged. Clients see a single "invalid token" outcome.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidTokenReason {
    #[error("token is malformed")]
    Malformed,

    #[error("signature did not verify")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("token has no expiry")]
    MissingExpiry,

    #[error("token is missing the subject or role claim")]
    MissingClaims,
}

impl WireClaims {
    pub(crate) fn into_claims(self) -> Result<TokenClaims, InvalidTokenReason> {
        let sub = non_blank(self.sub).ok_or(InvalidTokenReason::MissingClaims)?;
        let role = non_blank(self.role).ok_or(InvalidTokenReason::MissingClaims)?;
        let exp = self.exp.ok_or(InvalidTokenReason::MissingExpiry)?;
        let expires_at =
            DateTime::from_timestamp(exp, 0).ok_or(InvalidTokenReason::Malformed)?;
        let issued_at = match self.iat {
            Some(iat) => Some(DateTime::from_timestamp(iat, 0).ok_or(InvalidTokenReason::Malformed)?),
            None => None,
        };

        Ok(TokenClaims {
            sub,
            role: Role::from(role),
            issued_at,
            expires_at,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Deterministically validate the time window of verified claims.
///
/// A token is expired from the instant `now` reaches `expires_at`. No leeway.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), InvalidTokenReason> {
    if now >= claims.expires_at {
        return Err(InvalidTokenReason::Expired);
    }
    Ok(())
}
