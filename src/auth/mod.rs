//! Authentication and session module.
//!
//! Two halves share this module:
//!
//! - **Login**: [`Authenticator`] checks a username/password against the
//!   provisioned [`CredentialStore`] (bcrypt digests), then the caller issues a
//!   signed token with [`TokenCodec`].
//! - **Sessions**: [`SessionGuard`] turns a bearer token back into a
//!   [`Username`](crate::types::Username) for every protected operation.
//!
//! ## Security Model
//!
//! - Unknown usernames and wrong passwords are indistinguishable to callers
//! - Tokens are HMAC-signed JWTs; validity is signature plus `exp`, no
//!   server-side state and no revocation
//! - The guard does not re-check the credential table; existence was proven
//!   at login
//!
//! ## Usage
//!
//! ```ignore
//! let identity = authenticator.authenticate("sajan", "secret")?;
//! let token = codec.issue(identity.username(), Duration::minutes(30))?;
//!
//! // Later, on a protected request
//! let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
//! let username = guard.resolve_header(header)?;
//! ```

mod authenticator;
mod context;
mod credentials;
mod error;
mod extractor;
mod password;
mod session;
mod token;

pub use authenticator::Authenticator;
pub use context::Identity;
pub use credentials::{Credential, CredentialError, CredentialStore};
pub use error::{AuthError, TokenError};
pub use extractor::{CurrentUser, Reader};
pub use password::{
    DEFAULT_BCRYPT_COST, MAX_BCRYPT_COST, MIN_BCRYPT_COST, PasswordError, PasswordVerifier,
    digest_cost,
};
pub use session::{SessionGuard, bearer_token};
pub use token::{
    DEFAULT_ACCESS_TOKEN_TTL_MINUTES, DEFAULT_TOKEN_TTL_MINUTES, TokenClaims, TokenCodec,
    parse_hmac_algorithm,
};
