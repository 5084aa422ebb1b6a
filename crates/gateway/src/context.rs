use axum::http::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};

use msa_auth::AuthenticatedIdentity;

/// Verified subject, forwarded to upstream services.
pub const AUTH_EMAIL_HEADER: HeaderName = HeaderName::from_static("x-auth-email");

/// Verified role claim, forwarded verbatim (not normalised).
pub const AUTH_ROLE_HEADER: HeaderName = HeaderName::from_static("x-auth-role");

/// Identity headers for a verified caller, ready to be attached to a request.
///
/// Built before the request is touched so that attaching them cannot fail
/// halfway through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityHeaders {
    email: HeaderValue,
    role: HeaderValue,
}

impl IdentityHeaders {
    pub fn try_from_identity(identity: &AuthenticatedIdentity) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            email: HeaderValue::from_str(&identity.email)?,
            role: HeaderValue::from_str(identity.role.as_str())?,
        })
    }

    /// Set both headers, replacing any values the client sent.
    pub fn apply(self, headers: &mut HeaderMap) {
        headers.insert(AUTH_EMAIL_HEADER, self.email);
        headers.insert(AUTH_ROLE_HEADER, self.role);
    }
}
