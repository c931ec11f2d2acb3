//! Startup configuration.
//!
//! Everything here is read once before the server starts. Problems are fatal:
//! the binary refuses to start rather than serve with a missing signing key or
//! an empty credential table.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fmt, fs};
use thiserror::Error;

use crate::auth::{
    Credential, CredentialError, DEFAULT_ACCESS_TOKEN_TTL_MINUTES, DEFAULT_BCRYPT_COST,
    DEFAULT_TOKEN_TTL_MINUTES, MAX_BCRYPT_COST, MIN_BCRYPT_COST, parse_hmac_algorithm,
};

pub const DEFAULT_ALGORITHM: &str = "HS256";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_APP_NAME: &str = "itemvault";
pub const DEFAULT_APP_ENV: &str = "development";

/// Upper bound on configured token lifetimes (one year).
pub const MAX_TTL_MINUTES: i64 = 525_600;

/// Whether reading items (single item and full listing) needs a session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReadAccess {
    /// Anyone may read.
    #[default]
    Open,
    /// Reads need a valid bearer token, like writes.
    Session,
}

impl fmt::Display for ReadAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Session => write!(f, "session"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SECRET_KEY is not set or empty")]
    MissingSecret,
    #[error("unsupported token algorithm {0:?} (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),
    #[error("{name} must be between 1 and 525600 minutes, got {minutes}")]
    InvalidTtl { name: &'static str, minutes: i64 },
    #[error("bcrypt cost must be between 4 and 31, got {0}")]
    InvalidBcryptCost(u32),
    #[error("invalid credential table: {0}")]
    Credentials(#[from] CredentialError),
    #[error("failed to read users file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse users file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Process configuration, assembled by the binary from flags and environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HMAC signing secret.
    pub secret_key: String,
    /// Token algorithm identifier (HS256, HS384 or HS512).
    pub algorithm: String,
    /// Lifetime of tokens issued by the login route.
    pub access_token_ttl_minutes: i64,
    /// Lifetime of tokens issued without an explicit ttl.
    pub default_token_ttl_minutes: i64,
    pub read_access: ReadAccess,
    pub bcrypt_cost: u32,
    /// Provisioned users.
    pub credentials: Vec<Credential>,
    pub app_name: String,
    pub app_env: String,
    pub bind: String,
}

impl AppConfig {
    /// Config with defaults for everything except the secret and users.
    pub fn new(secret_key: impl Into<String>, credentials: Vec<Credential>) -> Self {
        Self {
            secret_key: secret_key.into(),
            algorithm: DEFAULT_ALGORITHM.to_string(),
            access_token_ttl_minutes: DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
            default_token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            read_access: ReadAccess::default(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            credentials,
            app_name: DEFAULT_APP_NAME.to_string(),
            app_env: DEFAULT_APP_ENV.to_string(),
            bind: DEFAULT_BIND.to_string(),
        }
    }

    /// Check every fatal startup condition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_key.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        parse_hmac_algorithm(&self.algorithm)
            .map_err(|_| ConfigError::UnsupportedAlgorithm(self.algorithm.clone()))?;
        if !(1..=MAX_TTL_MINUTES).contains(&self.access_token_ttl_minutes) {
            return Err(ConfigError::InvalidTtl {
                name: "ACCESS_TOKEN_EXPIRE_MINUTES",
                minutes: self.access_token_ttl_minutes,
            });
        }
        if !(1..=MAX_TTL_MINUTES).contains(&self.default_token_ttl_minutes) {
            return Err(ConfigError::InvalidTtl {
                name: "DEFAULT_TOKEN_EXPIRE_MINUTES",
                minutes: self.default_token_ttl_minutes,
            });
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(self.bcrypt_cost));
        }
        if self.credentials.is_empty() {
            return Err(CredentialError::Empty.into());
        }
        Ok(())
    }
}

/// On-disk credential table.
#[derive(Debug, Deserialize)]
pub struct UsersFile {
    pub users: Vec<Credential>,
}

/// Gather the credential table from an optional users file plus numbered
/// `USER{N}_*` variables.
pub fn load_credentials<F>(
    users_file: Option<&Path>,
    lookup: F,
) -> Result<Vec<Credential>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut credentials = Vec::new();
    if let Some(path) = users_file {
        credentials.extend(load_users_file(path, &lookup)?);
    }
    credentials.extend(credentials_from_env(&lookup));
    Ok(credentials)
}

/// Read a JSON users file, expanding `${VAR}` references in every field.
pub fn load_users_file<F>(path: &Path, lookup: F) -> Result<Vec<Credential>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: UsersFile = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(file
        .users
        .into_iter()
        .map(|c| {
            Credential::new(
                expand_env_vars(c.username.as_str(), &lookup),
                expand_env_vars(c.role.as_str(), &lookup),
                expand_env_vars(&c.password_hash, &lookup),
            )
        })
        .collect())
}

/// Read `USER1_USERNAME`, `USER1_ROLE`, `USER1_HASHED_PASSWORD`, then `USER2_*`
/// and so on, stopping at the first missing username.
///
/// A missing role defaults to "user"; a missing hash is kept empty so the
/// credential table rejects it at startup.
pub fn credentials_from_env<F>(lookup: F) -> Vec<Credential>
where
    F: Fn(&str) -> Option<String>,
{
    let mut credentials = Vec::new();
    for n in 1.. {
        let Some(username) = lookup(&format!("USER{}_USERNAME", n)) else {
            break;
        };
        let role = lookup(&format!("USER{}_ROLE", n)).unwrap_or_else(|| "user".to_string());
        let hash = lookup(&format!("USER{}_HASHED_PASSWORD", n)).unwrap_or_default();
        credentials.push(Credential::new(username, role, hash));
    }
    credentials
}

/// Process environment lookup for the loaders above.
pub fn process_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn expand_env_vars<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next(); // consume '{'
            let mut name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
            if let Some(val) = lookup(&name) {
                out.push_str(&val);
            } else {
                out.push_str("${");
                out.push_str(&name);
                out.push('}');
            }
        } else {
            out.push(ch);
        }
    }

    out
}
