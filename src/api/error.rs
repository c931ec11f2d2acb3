//! Translation of core outcomes into HTTP responses.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::{AuthError, TokenError};
use crate::store::StoreError;

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Store(StoreError::Conflict(_)) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Forbidden { .. }) => StatusCode::FORBIDDEN,
            Self::Store(StoreError::InvalidItem(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Auth(AuthError::AuthenticationFailed) => "authentication_failed",
            Self::Auth(AuthError::Unauthenticated) => "unauthenticated",
            Self::Store(StoreError::Conflict(_)) => "conflict",
            Self::Store(StoreError::NotFound(_)) => "not_found",
            Self::Store(StoreError::Forbidden { .. }) => "forbidden",
            Self::Store(StoreError::InvalidItem(_)) => "invalid_item",
            Self::Internal(_) => "internal_error",
        }
    }

    // Client-facing text. Never includes who owns an item or why a token failed.
    fn message(&self) -> String {
        match self {
            Self::Auth(err) => err.to_string(),
            Self::Store(StoreError::Conflict(_)) => "Item exists".to_string(),
            Self::Store(StoreError::NotFound(_)) => "Item not found".to_string(),
            Self::Store(StoreError::Forbidden { .. }) => "You are not authorized".to_string(),
            Self::Store(StoreError::InvalidItem(reason)) => format!("Invalid item: {}", reason),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!("Request failed: {}", detail);
        }

        let status = self.status();
        let body = Json(json!({
            "error": self.code(),
            "message": self.message(),
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
