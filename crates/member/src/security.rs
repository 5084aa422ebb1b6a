//! In-service token verification.
//!
//! The member service re-verifies the raw bearer token itself instead of
//! trusting the `X-Auth-*` headers added by the gateway. A token that does not
//! verify just leaves the request anonymous; the handler extractors below
//! decide whether an anonymous caller is acceptable.
//!
//! These per-handler rules are maintained separately from the gateway's
//! admin path list. Nothing keeps the two in sync.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use msa_auth::{AuthenticatedIdentity, TokenCodec};

#[derive(Debug, Clone)]
pub struct MemberSecurity {
    codec: Arc<TokenCodec>,
}

impl MemberSecurity {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Identity behind the request's bearer token, if it verifies.
    pub fn identify(&self, headers: &HeaderMap) -> Option<AuthenticatedIdentity> {
        let token = headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;

        match self.codec.verify_identity(token) {
            Ok(identity) => Some(identity),
            Err(err) => {
                tracing::debug!(reason = %err.reason(), "bearer token ignored");
                None
            }
        }
    }
}

/// Middleware: attach the verified identity to the request extensions.
pub async fn verify_bearer(
    State(security): State<MemberSecurity>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(identity) = security.identify(req.headers()) {
        req.extensions_mut().insert(identity);
    }
    next.run(req).await
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("ADMIN role required")]
    AdminRequired,
}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        let status = match self {
            AccessDenied::Unauthenticated => StatusCode::UNAUTHORIZED,
            AccessDenied::AdminRequired => StatusCode::FORBIDDEN,
        };
        (status, axum::Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// Any verified caller.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub AuthenticatedIdentity);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentIdentity {
    type Rejection = AccessDenied;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or(AccessDenied::Unauthenticated)
    }
}

/// A verified caller holding the ADMIN role.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub AuthenticatedIdentity);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminIdentity {
    type Rejection = AccessDenied;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentIdentity(identity) = CurrentIdentity::from_request_parts(parts, state).await?;
        if !identity.is_admin() {
            return Err(AccessDenied::AdminRequired);
        }
        Ok(AdminIdentity(identity))
    }
}
