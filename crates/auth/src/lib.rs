//! `msa-auth` — bearer-token codec and path classification for the edge gate.
//!
//! This crate is intentionally decoupled from HTTP. The gateway and the
//! services embed it and do their own request plumbing.

pub mod claims;
pub mod codec;
pub mod identity;
pub mod paths;
pub mod roles;
pub mod signing_key;

pub use claims::{InvalidTokenReason, TokenClaims, validate_claims};
pub use codec::{DEFAULT_TOKEN_TTL_SECS, InvalidToken, SignError, TokenCodec};
pub use identity::AuthenticatedIdentity;
pub use paths::{PathPattern, PathRules};
pub use roles::Role;
pub use signing_key::{MIN_SECRET_LEN, SigningKey, WeakSigningKey};
