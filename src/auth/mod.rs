//! Authenticated identity and role capabilities.
//!
//! Session issuance lives in the external auth service; this module only
//! models what a resolved bearer token yields: a user id plus a role. The
//! middleware in `api::middleware` performs the actual token resolution.

mod roles;

pub use roles::{Capability, Role};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::PalmaresError;

/// SHA-256 hex digest of a bearer token. Only digests are stored, so a
/// leaked session table does not leak usable tokens.
pub fn token_digest(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Identity injected into request extensions once a bearer token resolves.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = PalmaresError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
            PalmaresError::Authentication("missing or invalid bearer token".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_digest_is_stable_hex() {
        let digest = token_digest("dev-token-lea");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, token_digest("dev-token-lea"));
        assert_ne!(digest, token_digest("dev-token-noe"));
    }
}
