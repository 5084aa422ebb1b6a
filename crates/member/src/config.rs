use std::net::SocketAddr;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8082";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Member service configuration.
///
/// The secret is the same one the gateway uses; the service keeps its own
/// copy so that it can verify tokens without trusting gateway headers.
#[derive(Debug, Clone)]
pub struct MemberConfig {
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
}

impl MemberConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let bind_addr: SocketAddr = var("MEMBER_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: "MEMBER_BIND_ADDR",
                reason: e.to_string(),
            })?;

        Ok(Self {
            jwt_secret,
            bind_addr,
        })
    }
}
