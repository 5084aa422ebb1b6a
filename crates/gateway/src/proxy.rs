//! Forwarding of admitted requests to the upstream services.

use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::errors::json_message;
use crate::request_path::RequestPath;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// A path prefix served by one upstream base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    prefix: String,
    base_url: String,
}

impl Upstream {
    pub fn new(prefix: impl Into<String>, base_url: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let base_url = base_url.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Prefix match on a segment boundary: `/api/v1/boards` serves
    /// `/api/v1/boards/7` but not `/api/v1/boardsx`.
    pub fn serves(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || self.prefix.is_empty(),
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Proxy {
    client: reqwest::Client,
    upstreams: Arc<Vec<Upstream>>,
}

impl Proxy {
    pub fn new(upstreams: Vec<Upstream>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            upstreams: Arc::new(upstreams),
        })
    }

    /// Longest matching prefix wins.
    pub fn route(&self, path: &str) -> Option<&Upstream> {
        self.upstreams
            .iter()
            .filter(|u| u.serves(path))
            .max_by_key(|u| u.prefix.len())
    }
}

/// Fallback handler: relay the request to its upstream and the answer back.
pub async fn forward(State(proxy): State<Proxy>, req: Request) -> Response {
    let path = match RequestPath::parse(req.uri().path()) {
        Ok(path) => path,
        Err(err) => return err.into_response(),
    };

    let Some(upstream) = proxy.route(path.decoded()) else {
        return json_message(StatusCode::NOT_FOUND, "No route for path");
    };

    let target = match req.uri().query() {
        Some(query) => format!("{}{}?{}", upstream.base_url(), path.encoded(), query),
        None => format!("{}{}", upstream.base_url(), path.encoded()),
    };

    let (parts, body) = req.into_parts();
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return json_message(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"),
    };

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);

    let sent = proxy
        .client
        .request(parts.method, &target)
        .headers(headers)
        .body(body)
        .send()
        .await;

    match sent {
        Ok(upstream_response) => relay(upstream_response).await,
        Err(err) => {
            tracing::warn!(url = %target, error = %err, "upstream request failed");
            json_message(StatusCode::BAD_GATEWAY, "Upstream unavailable")
        }
    }
}

async fn relay(upstream_response: reqwest::Response) -> Response {
    let status = upstream_response.status();
    let mut headers = upstream_response.headers().clone();
    strip_hop_by_hop(&mut headers);

    match upstream_response.bytes().await {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            response
        }
        Err(err) => {
            tracing::warn!(error = %err, "upstream response body failed");
            json_message(StatusCode::BAD_GATEWAY, "Upstream unavailable")
        }
    }
}

/// Drop connection-scoped headers; they must not be relayed in either direction.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let hop_by_hop = [
        header::CONNECTION,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        header::TE,
        header::TRAILER,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
        header::HOST,
        header::CONTENT_LENGTH,
    ];
    for name in hop_by_hop {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}
