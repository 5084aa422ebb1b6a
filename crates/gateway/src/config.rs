//! Gateway configuration, read once from the environment at startup.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::proxy::Upstream;

pub const DEFAULT_OPEN_PATHS: &[&str] = &[
    "/api/v1/auth/login",
    "/api/v1/auth/signup",
    "/api/v1/members/sync",
    "/actuator/**",
];

pub const DEFAULT_ADMIN_PATHS: &[&str] = &[
    "/api/v1/members",
    "/api/v1/members/**",
    "/api/v1/admin/**",
];

pub const DEFAULT_CORS_ALLOWED_ORIGINS: &[&str] = &["http://localhost:8080", "http://127.0.0.1:8080"];

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TTL_SECS: i64 = msa_auth::DEFAULT_TOKEN_TTL_SECS;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Shared HMAC secret. Length is checked when the signing key is built.
    pub jwt_secret: String,

    /// Lifetime of tokens issued with this configuration, in seconds.
    pub token_ttl_secs: i64,

    pub open_paths: Vec<String>,
    pub admin_paths: Vec<String>,

    pub upstreams: Vec<Upstream>,

    /// Browser origins allowed to call the gateway cross-origin.
    pub cors_allowed_origins: Vec<HeaderValue>,

    pub bind_addr: SocketAddr,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let token_ttl_secs = match var("JWT_EXPIRATION_SECONDS") {
            Some(raw) => parse_ttl(&raw)?,
            None => DEFAULT_TTL_SECS,
        };

        let open_paths = var("GATEWAY_OPEN_PATHS")
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|| to_owned(DEFAULT_OPEN_PATHS));
        let admin_paths = var("GATEWAY_ADMIN_PATHS")
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|| to_owned(DEFAULT_ADMIN_PATHS));

        let identity = var("IDENTITY_SERVICE_URL").unwrap_or_else(|| "http://localhost:8081".to_string());
        let member = var("MEMBER_SERVICE_URL").unwrap_or_else(|| "http://localhost:8082".to_string());
        let board = var("BOARD_SERVICE_URL").unwrap_or_else(|| "http://localhost:8083".to_string());

        let cors_allowed_origins = match var("CORS_ALLOWED_ORIGINS") {
            Some(raw) => parse_origins(&split_list(&raw))?,
            None => parse_origins(&to_owned(DEFAULT_CORS_ALLOWED_ORIGINS))?,
        };

        let bind_addr = var("GATEWAY_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            name: "GATEWAY_BIND_ADDR",
            reason: e.to_string(),
        })?;

        Ok(Self {
            jwt_secret,
            token_ttl_secs,
            open_paths,
            admin_paths,
            upstreams: default_upstreams(&identity, &member, &board),
            cors_allowed_origins,
            bind_addr,
        })
    }
}

/// Route table mirroring the deployed services.
pub fn default_upstreams(identity: &str, member: &str, board: &str) -> Vec<Upstream> {
    vec![
        Upstream::new("/api/v1/auth", identity),
        Upstream::new("/api/v1/admin", identity),
        Upstream::new("/api/v1/members", member),
        Upstream::new("/api/v1/boards", board),
    ]
}

fn parse_ttl(raw: &str) -> Result<i64, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: "JWT_EXPIRATION_SECONDS",
        reason,
    };

    let secs: i64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
    if secs <= 0 {
        return Err(invalid("must be positive".to_string()));
    }
    if chrono::Duration::try_seconds(secs).is_none() {
        return Err(invalid("out of range".to_string()));
    }
    Ok(secs)
}

fn parse_origins(origins: &[String]) -> Result<Vec<HeaderValue>, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: "CORS_ALLOWED_ORIGINS",
        reason,
    };

    origins
        .iter()
        .map(|origin| {
            if origin == "*" {
                return Err(invalid("wildcard origin is not allowed".to_string()));
            }
            HeaderValue::from_str(origin).map_err(|e| invalid(format!("{origin}: {e}")))
        })
        .collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let cfg = GatewayConfig::from_lookup(lookup(&[(
            "JWT_SECRET",
            "change-me-please-change-me-32bytes",
        )]))
        .unwrap();

        assert_eq!(cfg.token_ttl_secs, 3600);
        assert_eq!(cfg.open_paths, to_owned(DEFAULT_OPEN_PATHS));
        assert_eq!(cfg.admin_paths, to_owned(DEFAULT_ADMIN_PATHS));
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.upstreams.len(), 4);
        assert_eq!(
            cfg.cors_allowed_origins,
            vec!["http://localhost:8080", "http://127.0.0.1:8080"]
        );
    }

    #[test]
    fn secret_is_required() {
        let err = GatewayConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn path_lists_are_comma_separated() {
        let cfg = GatewayConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "change-me-please-change-me-32bytes"),
            ("GATEWAY_OPEN_PATHS", " /public/** , /status,"),
            ("GATEWAY_ADMIN_PATHS", "/ops/**"),
        ]))
        .unwrap();

        assert_eq!(cfg.open_paths, vec!["/public/**", "/status"]);
        assert_eq!(cfg.admin_paths, vec!["/ops/**"]);
    }

    #[test]
    fn invalid_ttl_is_rejected() {
        for raw in ["abc", "0", "-5", "9223372036854775807", "99999999999999999999"] {
            let err = GatewayConfig::from_lookup(lookup(&[
                ("JWT_SECRET", "change-me-please-change-me-32bytes"),
                ("JWT_EXPIRATION_SECONDS", raw),
            ]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { name: "JWT_EXPIRATION_SECONDS", .. }));
        }
    }

    #[test]
    fn cors_origins_are_comma_separated() {
        let cfg = GatewayConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "change-me-please-change-me-32bytes"),
            ("CORS_ALLOWED_ORIGINS", "https://board.example.com, http://localhost:3000"),
        ]))
        .unwrap();

        assert_eq!(
            cfg.cors_allowed_origins,
            vec!["https://board.example.com", "http://localhost:3000"]
        );
    }

    #[test]
    fn wildcard_or_unprintable_origins_are_rejected() {
        for raw in ["*", "http://a.example.com,*", "http://bad\u{7f}origin"] {
            let err = GatewayConfig::from_lookup(lookup(&[
                ("JWT_SECRET", "change-me-please-change-me-32bytes"),
                ("CORS_ALLOWED_ORIGINS", raw),
            ]))
            .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { name: "CORS_ALLOWED_ORIGINS", .. }),
                "origins {raw:?}"
            );
        }
    }

    #[test]
    fn upstream_urls_come_from_environment() {
        let cfg = GatewayConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "change-me-please-change-me-32bytes"),
            ("MEMBER_SERVICE_URL", "http://member:9000"),
        ]))
        .unwrap();

        let member = cfg
            .upstreams
            .iter()
            .find(|u| u.prefix() == "/api/v1/members")
            .unwrap();
        assert_eq!(member.base_url(), "http://member:9000");
    }
}
