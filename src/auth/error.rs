//! Error types for authentication and session checks.

use thiserror::Error;

/// Outcomes that reject a caller.
///
/// The variants carry no detail: a bad username and a bad
/// password are the same `AuthenticationFailed`, and every token problem is the
/// same `Unauthenticated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Username/password pair did not match a provisioned credential.
    #[error("Incorrect username or password")]
    AuthenticationFailed,

    /// Missing, malformed, mis-signed or expired bearer token.
    #[error("Invalid token")]
    Unauthenticated,
}

/// Errors from encoding or decoding access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signing failed (bad key material or claims that cannot be serialized).
    #[error("Failed to encode token: {0}")]
    Encode(String),

    /// Bad encoding, wrong algorithm, signature mismatch or missing claims.
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Signature verified but `exp` has passed.
    #[error("Token expired")]
    Expired,
}
