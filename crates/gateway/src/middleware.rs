//! The edge authentication gate.
//!
//! [`AuthGate::evaluate`] is the decision pipeline: a pure function of the
//! request line and headers. [`authenticate`] applies its decision to the
//! request, so nothing is mutated until the outcome is final.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use msa_auth::{AuthenticatedIdentity, PathRules, TokenCodec};

use crate::context::IdentityHeaders;
use crate::errors::AuthRejection;
use crate::request_path::RequestPath;

/// Outcome of a successful evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Preflight or open path: forward untouched.
    Forward,

    /// Token verified and role sufficient: forward with identity headers.
    Authenticated(AuthenticatedIdentity),
}

#[derive(Debug, Clone)]
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    rules: Arc<PathRules>,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, rules: Arc<PathRules>) -> Self {
        Self { codec, rules }
    }

    pub fn evaluate(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<GateDecision, AuthRejection> {
        if *method == Method::OPTIONS || self.rules.is_open(path) {
            return Ok(GateDecision::Forward);
        }

        let token = extract_bearer(headers)?;

        let claims = self.codec.verify_at(token, now).map_err(|err| {
            tracing::debug!(path, reason = %err.reason(), "token rejected");
            AuthRejection::InvalidToken
        })?;

        if self.rules.requires_admin(path) && !claims.role.is_admin() {
            tracing::info!(path, role = %claims.role, "admin path refused");
            return Err(AuthRejection::InsufficientRole);
        }

        Ok(GateDecision::Authenticated(claims.into()))
    }
}

/// Axum middleware running the gate in front of every route.
///
/// The path is canonicalised first and the request URI rewritten to that
/// form, so the upstream receives exactly the path the rules classified.
pub async fn authenticate(State(gate): State<AuthGate>, mut req: Request, next: Next) -> Response {
    let path = match RequestPath::parse(req.uri().path()) {
        Ok(path) => path,
        Err(err) => {
            tracing::debug!(path = req.uri().path(), error = %err, "request path refused");
            return err.into_response();
        }
    };
    match path.rewrite(req.uri()) {
        Ok(uri) => *req.uri_mut() = uri,
        Err(err) => return err.into_response(),
    }

    let decision = gate.evaluate(req.method(), path.decoded(), req.headers(), Utc::now());

    match decision {
        Ok(GateDecision::Forward) => next.run(req).await,
        Ok(GateDecision::Authenticated(identity)) => {
            let Ok(headers) = IdentityHeaders::try_from_identity(&identity) else {
                tracing::debug!("identity cannot be carried in headers");
                return AuthRejection::InvalidToken.into_response();
            };
            headers.apply(req.headers_mut());
            next.run(req).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthRejection> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthRejection::MissingOrMalformedAuthHeader)?;

    let header = header
        .to_str()
        .map_err(|_| AuthRejection::MissingOrMalformedAuthHeader)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthRejection::MissingOrMalformedAuthHeader)?;

    if token.is_empty() {
        return Err(AuthRejection::MissingOrMalformedAuthHeader);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, body::Body, http::StatusCode};
    use chrono::Duration;
    use msa_auth::{Role, SigningKey};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{DEFAULT_ADMIN_PATHS, DEFAULT_OPEN_PATHS};
    use crate::context::{AUTH_EMAIL_HEADER, AUTH_ROLE_HEADER};

    const SECRET: &str = "change-me-please-change-me-32bytes";

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::with_default_ttl(Arc::new(
            SigningKey::from_secret(SECRET).unwrap(),
        )))
    }

    fn gate() -> AuthGate {
        AuthGate::new(
            codec(),
            Arc::new(PathRules::new(DEFAULT_OPEN_PATHS, DEFAULT_ADMIN_PATHS)),
        )
    }

    fn token(subject: &str, role: Role) -> String {
        codec().issue(subject, &role).unwrap()
    }

    /// Echoes the path and headers the downstream stage received.
    async fn echo(req: Request) -> Json<Value> {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Json(json!({
            "path": req.uri().path(),
            "email": header(AUTH_EMAIL_HEADER.as_str()),
            "role": header(AUTH_ROLE_HEADER.as_str()),
            "authorization": header("authorization"),
        }))
    }

    fn app() -> Router {
        Router::new()
            .fallback(echo)
            .layer(axum::middleware::from_fn_with_state(gate(), authenticate))
    }

    async fn send(method: Method, path: &str, authorization: Option<&str>) -> (StatusCode, Value) {
        let mut builder = axum::http::Request::builder().method(method).uri(path);
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn admin_token_on_admin_path_forwards_with_identity_headers() {
        let bearer = format!("Bearer {}", token("admin@example.com", Role::ADMIN));
        let (status, body) = send(Method::GET, "/api/v1/members", Some(&bearer)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "admin@example.com");
        assert_eq!(body["role"], "ADMIN");
        assert_eq!(body["authorization"], bearer.as_str());
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let (status, body) = send(Method::GET, "/api/v1/members", None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "message": "Missing or invalid Authorization header" }));
    }

    #[tokio::test]
    async fn non_bearer_schemes_are_unauthorized() {
        for value in ["Basic dXNlcjpwYXNz", "bearer abc", "Bearer ", "Token abc"] {
            let (status, body) = send(Method::GET, "/api/v1/boards", Some(value)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "header {value:?}");
            assert_eq!(body["message"], "Missing or invalid Authorization header");
        }
    }

    #[tokio::test]
    async fn padded_token_is_verified_as_sent() {
        let padded = format!("Bearer   {}", token("reader@example.com", Role::USER));
        let (status, body) = send(Method::GET, "/api/v1/boards", Some(&padded)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "message": "Invalid or expired token" }));
    }

    #[tokio::test]
    async fn user_token_on_admin_path_is_forbidden() {
        let bearer = format!("Bearer {}", token("user@example.com", Role::USER));
        let (status, body) = send(Method::GET, "/api/v1/members", Some(&bearer)).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "message": "ADMIN role required" }));
    }

    #[tokio::test]
    async fn lowercase_admin_role_passes_admin_check() {
        let bearer = format!("Bearer {}", token("root@example.com", Role::new("admin")));
        let (status, body) = send(Method::GET, "/api/v1/admin/users", Some(&bearer)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "admin");
    }

    #[tokio::test]
    async fn open_path_forwards_whatever_the_authorization() {
        for authorization in [None, Some("Bearer not-a-token"), Some("Basic abc")] {
            let (status, body) = send(Method::GET, "/api/v1/auth/login", authorization).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["email"], Value::Null);
            assert_eq!(body["role"], Value::Null);
        }
    }

    #[tokio::test]
    async fn preflight_is_never_challenged() {
        let (status, _) = send(Method::OPTIONS, "/api/v1/members", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn user_token_on_regular_path_forwards() {
        let bearer = format!("Bearer {}", token("reader@example.com", Role::USER));
        let (status, body) = send(Method::GET, "/api/v1/boards", Some(&bearer)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "reader@example.com");
        assert_eq!(body["role"], "USER");
    }

    #[tokio::test]
    async fn tampered_and_expired_tokens_share_one_message() {
        let mut tampered = token("user@example.com", Role::USER);
        tampered.insert(tampered.len() / 2, 'x');

        let expired = codec()
            .sign(
                "user@example.com",
                &Role::USER,
                Utc::now() - Duration::hours(2),
                Duration::hours(1),
            )
            .unwrap();

        for token in [tampered, expired] {
            let (status, body) =
                send(Method::GET, "/api/v1/boards", Some(&format!("Bearer {token}"))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, json!({ "message": "Invalid or expired token" }));
        }
    }

    #[tokio::test]
    async fn dot_segments_cannot_escape_into_admin_paths() {
        let bearer = format!("Bearer {}", token("user@example.com", Role::USER));
        for path in [
            "/api/v1/auth/../admin/users",
            "/api/v1/auth/%2e%2e/admin/users",
            "/api/v1/boards/./../../v1/members",
            "/api/v1//members",
            "/api/v1/%6Dembers",
        ] {
            let (status, body) = send(Method::GET, path, Some(&bearer)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "path {path:?}");
            assert_eq!(body, json!({ "message": "ADMIN role required" }));
        }
    }

    #[tokio::test]
    async fn dot_segments_cannot_escape_out_of_open_paths() {
        let (status, body) = send(Method::GET, "/api/v1/auth/login/../../boards", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Missing or invalid Authorization header");
    }

    #[tokio::test]
    async fn downstream_sees_the_classified_path() {
        let bearer = format!("Bearer {}", token("admin@example.com", Role::ADMIN));
        let (status, body) =
            send(Method::GET, "/api/v1/auth/%2e%2e//admin/./users?page=1", Some(&bearer)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["path"], "/api/v1/admin/users");
    }

    #[tokio::test]
    async fn encoded_separators_are_bad_requests() {
        let bearer = format!("Bearer {}", token("admin@example.com", Role::ADMIN));
        for path in ["/api/v1/auth%2F..%2Fadmin/users", "/api/v1/boards/..%5Cx"] {
            let (status, body) = send(Method::GET, path, Some(&bearer)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "path {path:?}");
            assert_eq!(body, json!({ "message": "Malformed request path" }));
        }
    }

    #[test]
    fn evaluate_does_not_depend_on_wall_clock() {
        let gate = gate();
        let now = Utc::now();
        let token = codec()
            .sign("user@example.com", &Role::USER, now, Duration::minutes(5))
            .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );

        let decision = gate.evaluate(&Method::GET, "/api/v1/boards", &headers, now);
        assert_eq!(
            decision,
            Ok(GateDecision::Authenticated(AuthenticatedIdentity::new(
                "user@example.com",
                Role::USER
            )))
        );

        let later = gate.evaluate(
            &Method::GET,
            "/api/v1/boards",
            &headers,
            now + Duration::minutes(6),
        );
        assert_eq!(later, Err(AuthRejection::InvalidToken));
    }
}
