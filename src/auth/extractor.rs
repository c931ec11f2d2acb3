//! Authentication extractors for HTTP requests.
//!
//! Handlers declare the session they need as an argument; the extractor runs
//! the [`SessionGuard`] before the handler body, so a rejected token never
//! reaches the item store.

use axum::extract::{FromRef, FromRequestParts};
use http::header::AUTHORIZATION;
use http::request::Parts;

use crate::api::ApiError;
use crate::auth::session::SessionGuard;
use crate::config::ReadAccess;
use crate::types::Username;

/// A caller holding a valid bearer token. Rejects with 401 otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Username);

/// A caller allowed to read items under the configured [`ReadAccess`].
///
/// With `ReadAccess::Open` any request passes, and the username is filled in
/// only when a valid token happens to be present. With `ReadAccess::Session`
/// this behaves like [`CurrentUser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reader(pub Option<Username>);

fn authorization(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

impl<S> FromRequestParts<S> for CurrentUser
where
    SessionGuard: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let guard = SessionGuard::from_ref(state);
        let username = guard.resolve_header(authorization(parts))?;
        Ok(CurrentUser(username))
    }
}

impl<S> FromRequestParts<S> for Reader
where
    SessionGuard: FromRef<S>,
    ReadAccess: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let guard = SessionGuard::from_ref(state);
        let result = guard.resolve_header(authorization(parts));
        match ReadAccess::from_ref(state) {
            ReadAccess::Open => Ok(Reader(result.ok())),
            ReadAccess::Session => Ok(Reader(Some(result?))),
        }
    }
}
