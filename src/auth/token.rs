//! Signed, expiring access tokens (JWT with an HMAC secret).
//!
//! Tokens are never stored server-side: validity is purely signature plus
//! `exp`. Only the configured algorithm is accepted on decode, which rules out
//! `alg: none` and asymmetric algorithm confusion.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::auth::error::TokenError;
use crate::types::Username;

/// Default lifetime of a token issued without an explicit ttl.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 15;

/// Lifetime used by the login flow unless configured otherwise.
pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 30;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (username). Missing decodes as empty, which sessions reject.
    #[serde(default)]
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued-at time (Unix timestamp)
    #[serde(default)]
    pub iat: u64,
    /// Unique token id, for log correlation only.
    #[serde(default)]
    pub jti: String,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::try_from(self.exp).ok()?, 0)
    }
}

/// Parse a configured algorithm name, accepting only HMAC algorithms.
pub fn parse_hmac_algorithm(name: &str) -> Result<Algorithm, TokenError> {
    let algorithm = Algorithm::from_str(name.trim())
        .map_err(|_| TokenError::Invalid(format!("unknown algorithm {:?}", name)))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(TokenError::Invalid(format!(
            "algorithm {:?} is not a symmetric HMAC algorithm",
            other
        ))),
    }
}

/// Issues and verifies access tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec. `algorithm` must be one of HS256/HS384/HS512.
    pub fn new(
        secret: &[u8],
        algorithm: Algorithm,
        default_ttl: Duration,
    ) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Encode("signing secret is empty".to_string()));
        }
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(TokenError::Encode(format!(
                "algorithm {:?} is not a symmetric HMAC algorithm",
                algorithm
            )));
        }

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            default_ttl,
        })
    }

    /// HS256 codec with the 15 minute default ttl.
    pub fn hs256(secret: &[u8]) -> Result<Self, TokenError> {
        Self::new(
            secret,
            Algorithm::HS256,
            Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        )
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a token for `subject` valid for `ttl` from now.
    pub fn issue(&self, subject: &Username, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(subject, ttl, Utc::now())
    }

    /// Issue a token with the codec's default ttl.
    pub fn issue_default(&self, subject: &Username) -> Result<String, TokenError> {
        self.issue(subject, self.default_ttl)
    }

    /// Issue a token as if at `issued_at`.
    pub fn issue_at(
        &self,
        subject: &Username,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Encode("token ttl overflows".to_string()))?;

        let claims = TokenClaims {
            sub: subject.as_str().to_string(),
            exp: unix_seconds(expires_at),
            iat: unix_seconds(issued_at),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encode(e.to_string()))?;

        debug!(
            "Issued token {} for {} expiring at {}",
            claims.jti,
            subject,
            expires_at.to_rfc3339()
        );
        Ok(token)
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// Never returns claims from a token that failed either check.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            },
        )?;
        Ok(data.claims)
    }
}

fn unix_seconds(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp()).unwrap_or(0)
}
