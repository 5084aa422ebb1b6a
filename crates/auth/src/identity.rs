use serde::{Deserialize, Serialize};

use crate::{Role, TokenClaims};

/// Identity of a caller whose bearer token verified.
///
/// Lives for a single request: attached to the forwarded request at the
/// gateway, or to the request extensions inside a service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    pub email: String,
    pub role: Role,
}

impl AuthenticatedIdentity {
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<TokenClaims> for AuthenticatedIdentity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            email: claims.sub,
            role: claims.role,
        }
    }
}
