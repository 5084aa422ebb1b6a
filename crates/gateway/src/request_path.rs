//! Canonical form of an inbound request path.
//!
//! The gate classifies and the proxy forwards the same [`RequestPath`], so a
//! path cannot mean one thing to the rule set and another to the upstream.
//! Segments are percent-decoded, `.` and `..` are resolved, and empty
//! segments are dropped.

use axum::{
    http::{StatusCode, Uri, uri::PathAndQuery},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::errors::json_message;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathRejection {
    #[error("path segment is not valid percent-encoded UTF-8")]
    InvalidEncoding,

    #[error("path segment encodes a separator or control character")]
    EncodedSeparator,

    #[error("rewritten URI is invalid")]
    InvalidUri,
}

impl IntoResponse for PathRejection {
    fn into_response(self) -> Response {
        json_message(StatusCode::BAD_REQUEST, "Malformed request path")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    decoded: String,
    encoded: String,
}

impl RequestPath {
    pub fn parse(raw: &str) -> Result<Self, PathRejection> {
        let mut segments: Vec<String> = Vec::new();

        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            let decoded = urlencoding::decode(segment).map_err(|_| PathRejection::InvalidEncoding)?;
            if decoded.chars().any(|c| c == '/' || c == '\\' || c.is_control()) {
                return Err(PathRejection::EncodedSeparator);
            }

            match &*decoded {
                "." => {}
                ".." => {
                    segments.pop();
                }
                _ => segments.push(decoded.into_owned()),
            }
        }

        let trailing = raw.ends_with('/') && !segments.is_empty() && !ends_in_dot_segment(raw);
        let join = |parts: Vec<String>| {
            let mut path = format!("/{}", parts.join("/"));
            if trailing {
                path.push('/');
            }
            path
        };

        let encoded = segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();

        Ok(Self {
            decoded: join(segments),
            encoded: join(encoded),
        })
    }

    /// Decoded form, as the path rules see it.
    pub fn decoded(&self) -> &str {
        &self.decoded
    }

    /// Percent-encoded form, as sent upstream.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Replace the path of `uri` with the encoded form, keeping the query.
    pub fn rewrite(&self, uri: &Uri) -> Result<Uri, PathRejection> {
        let path_and_query = match uri.query() {
            Some(query) => format!("{}?{}", self.encoded, query),
            None => self.encoded.clone(),
        };

        let mut parts = uri.clone().into_parts();
        parts.path_and_query =
            Some(PathAndQuery::try_from(path_and_query).map_err(|_| PathRejection::InvalidUri)?);
        Uri::from_parts(parts).map_err(|_| PathRejection::InvalidUri)
    }
}

// `/a/b/..` and `/a/b/../` both resolve to `/a`.
fn ends_in_dot_segment(raw: &str) -> bool {
    raw.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|last| urlencoding::decode(last).ok())
        .is_some_and(|last| last == "." || last == "..")
}
