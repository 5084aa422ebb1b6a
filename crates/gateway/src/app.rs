//! Gateway application wiring (Axum router + gate + forwarding).

use std::sync::Arc;

use axum::{
    Json, Router,
    http::{Method, header},
    routing::get,
};
use chrono::Duration;
use serde_json::{Value, json};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};

use msa_auth::{PathPattern, PathRules, SigningKey, TokenCodec, WeakSigningKey};

use crate::config::GatewayConfig;
use crate::middleware::{self, AuthGate};
use crate::proxy::{self, Proxy};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    WeakSigningKey(#[from] WeakSigningKey),

    #[error("token lifetime of {0}s is out of range")]
    TokenTtlOutOfRange(i64),

    #[error("failed to build upstream HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Build the gate from configuration.
///
/// Fails on a weak secret, which keeps the process from ever serving traffic
/// without a usable key.
pub fn build_gate(config: &GatewayConfig) -> Result<AuthGate, GatewayError> {
    let key = Arc::new(SigningKey::from_secret(config.jwt_secret.as_bytes())?);
    let ttl = Duration::try_seconds(config.token_ttl_secs)
        .filter(|ttl| *ttl > Duration::zero())
        .ok_or(GatewayError::TokenTtlOutOfRange(config.token_ttl_secs))?;
    let codec = TokenCodec::new(key, ttl);
    let rules = PathRules::new(&config.open_paths, &config.admin_paths);

    tracing::info!(
        open_paths = ?patterns(rules.open_patterns()),
        admin_paths = ?patterns(rules.admin_patterns()),
        "auth gate configured"
    );

    Ok(AuthGate::new(Arc::new(codec), Arc::new(rules)))
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &GatewayConfig) -> Result<Router, GatewayError> {
    let gate = build_gate(config)?;
    let proxy = Proxy::new(config.upstreams.clone())?;

    // The gate wraps every route, including the forwarding fallback. CORS sits
    // outside it so preflights are answered without a token.
    let app = Router::new()
        .route("/actuator/health", get(health))
        .fallback(proxy::forward)
        .with_state(proxy)
        .layer(axum::middleware::from_fn_with_state(
            gate,
            middleware::authenticate,
        ))
        .layer(cors_layer(config));

    Ok(app)
}

fn patterns(list: &[PathPattern]) -> Vec<&str> {
    list.iter().map(PathPattern::as_str).collect()
}

fn cors_layer(config: &GatewayConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.cors_allowed_origins.iter().cloned()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}
