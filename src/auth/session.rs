//! Bearer token → verified username.

use std::sync::Arc;

use tracing::debug;

use crate::auth::error::AuthError;
use crate::auth::token::TokenCodec;
use crate::types::Username;

/// The check every protected item operation runs first.
///
/// Stateless: the subject is trusted as-is once the signature and expiry
/// verify, without a lookup in the credential table.
#[derive(Debug, Clone)]
pub struct SessionGuard {
    codec: Arc<TokenCodec>,
}

impl SessionGuard {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// Resolve a raw bearer token to the username it was issued for.
    pub fn resolve(&self, token: &str) -> Result<Username, AuthError> {
        let claims = self.codec.decode(token).map_err(|e| {
            debug!("Rejected bearer token: {}", e);
            AuthError::Unauthenticated
        })?;

        let subject = Username::new(claims.sub);
        if subject.is_blank() {
            debug!("Rejected bearer token {} with empty subject", claims.jti);
            return Err(AuthError::Unauthenticated);
        }

        Ok(subject)
    }

    /// Resolve an `Authorization` header value (`Bearer <token>`).
    pub fn resolve_header(&self, authorization: Option<&str>) -> Result<Username, AuthError> {
        let token = bearer_token(authorization.ok_or(AuthError::Unauthenticated)?)
            .ok_or(AuthError::Unauthenticated)?;
        self.resolve(token)
    }
}

/// Extract the token from a `Bearer <token>` header value.
///
/// The scheme is matched case-insensitively; an empty token yields `None`.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
