//! Member service router.
//!
//! Member persistence and CRUD live elsewhere; this router carries the
//! identity endpoints that sit on top of in-service token verification.

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use thiserror::Error;

use msa_auth::{SigningKey, TokenCodec, WeakSigningKey};

use crate::config::MemberConfig;
use crate::security::{self, AdminIdentity, CurrentIdentity, MemberSecurity};

#[derive(Debug, Error)]
pub enum MemberError {
    #[error(transparent)]
    WeakSigningKey(#[from] WeakSigningKey),
}

pub fn build_app(config: &MemberConfig) -> Result<Router, MemberError> {
    let key = Arc::new(SigningKey::from_secret(config.jwt_secret.as_bytes())?);
    let security = MemberSecurity::new(Arc::new(TokenCodec::with_default_ttl(key)));

    let app = Router::new()
        .route("/actuator/health", get(health))
        .route("/api/v1/members/me", get(me))
        .route("/api/v1/members/me/admin", get(me_admin))
        .layer(axum::middleware::from_fn_with_state(
            security,
            security::verify_bearer,
        ));

    Ok(app)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}

pub async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<Value> {
    Json(json!({
        "email": identity.email,
        "role": identity.role.as_str(),
    }))
}

pub async fn me_admin(AdminIdentity(identity): AdminIdentity) -> Json<Value> {
    Json(json!({
        "email": identity.email,
        "role": identity.role.as_str(),
        "admin": true,
    }))
}
