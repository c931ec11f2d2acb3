// REST API for login and item management

mod error;

pub use error::ApiError;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Form, Json, Router,
    extract::{FromRef, Path, State},
    routing::{get, post},
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::{
    Authenticator, CredentialStore, CurrentUser, PasswordVerifier, Reader, SessionGuard,
    TokenCodec, parse_hmac_algorithm,
};
use crate::config::{AppConfig, ReadAccess};
use crate::store::{Item, ItemPayload, ItemStore};
use crate::types::ItemKey;

/// Shared handles for every request. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub tokens: Arc<TokenCodec>,
    pub sessions: SessionGuard,
    pub items: ItemStore,
    pub read_access: ReadAccess,
    /// Lifetime of tokens handed out by `POST /token`.
    pub access_token_ttl: Duration,
    pub app_name: Arc<str>,
    pub app_env: Arc<str>,
    pub bind: Arc<str>,
}

impl AppState {
    /// Validate the configuration and build the stores, codec and guard.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let algorithm =
            parse_hmac_algorithm(&config.algorithm).context("Invalid token algorithm")?;
        let tokens = Arc::new(
            TokenCodec::new(
                config.secret_key.as_bytes(),
                algorithm,
                Duration::minutes(config.default_token_ttl_minutes),
            )
            .context("Failed to create token codec")?,
        );

        info!(
            "Signing tokens with {:?} (default ttl {} min)",
            tokens.algorithm(),
            tokens.default_ttl().num_minutes()
        );

        let credentials = Arc::new(
            CredentialStore::new(config.credentials.clone())
                .context("Invalid credential table")?,
        );
        info!(
            "Loaded {} credentials: {}",
            credentials.len(),
            credentials.usernames().join(", ")
        );

        let authenticator = Arc::new(
            Authenticator::new(credentials, PasswordVerifier::new(config.bcrypt_cost))
                .context("Failed to initialize authenticator")?,
        );

        Ok(Self {
            authenticator,
            sessions: SessionGuard::new(tokens.clone()),
            tokens,
            items: ItemStore::new(),
            read_access: config.read_access,
            access_token_ttl: Duration::minutes(config.access_token_ttl_minutes),
            app_name: config.app_name.as_str().into(),
            app_env: config.app_env.as_str().into(),
            bind: config.bind.as_str().into(),
        })
    }
}

impl FromRef<AppState> for SessionGuard {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for ReadAccess {
    fn from_ref(state: &AppState) -> Self {
        state.read_access
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/token", post(login))
        .route("/items", get(list_items))
        .route("/items/", get(list_items))
        .route(
            "/items/{item_id}",
            get(read_item)
                .post(create_item)
                .put(update_item)
                .delete(delete_item),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Form body of `POST /token`.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": format!(
            "{} running in {} mode on {}.",
            state.app_name, state.app_env, state.bind
        )
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let identity = state
        .authenticator
        .authenticate_async(form.username, form.password)
        .await?;

    let access_token = state
        .tokens
        .issue(identity.username(), state.access_token_ttl)?;

    info!(
        "Issued access token for {} (role {})",
        identity.username(),
        identity.role()
    );

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

async fn create_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<String>,
    Json(payload): Json<ItemPayload>,
) -> Result<Json<Value>, ApiError> {
    state
        .items
        .create(ItemKey::new(item_id), payload, &user)
        .await?;
    Ok(Json(json!({ "message": format!("Item created by {}", user) })))
}

async fn read_item(
    State(state): State<AppState>,
    _reader: Reader,
    Path(item_id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    let item = state.items.read(&ItemKey::new(item_id)).await?;
    Ok(Json(item))
}

async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<String>,
    Json(payload): Json<ItemPayload>,
) -> Result<Json<Value>, ApiError> {
    state
        .items
        .update(&ItemKey::new(item_id), payload, &user)
        .await?;
    Ok(Json(json!({ "message": format!("Item updated by {}", user) })))
}

async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.items.delete(&ItemKey::new(item_id), &user).await?;
    Ok(Json(json!({ "message": format!("Item deleted by {}", user) })))
}

async fn list_items(
    State(state): State<AppState>,
    _reader: Reader,
) -> Json<BTreeMap<ItemKey, Item>> {
    Json(state.items.list().await)
}
