//! Provisioned credential table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Role, Username};

/// A provisioned user: login name, role and bcrypt digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: Username,
    pub role: Role,
    /// bcrypt digest; `hashed_password` is accepted as the field name in files.
    #[serde(alias = "hashed_password")]
    pub password_hash: String,
}

impl Credential {
    pub fn new(
        username: impl Into<Username>,
        role: impl Into<Role>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            role: role.into(),
            password_hash: password_hash.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("credential table is empty")]
    Empty,
    #[error("duplicate username in credential table: {0}")]
    Duplicate(String),
    #[error("credential entry #{0} has an empty username")]
    MissingUsername(usize),
    #[error("credential for {0} has an empty password hash")]
    MissingHash(String),
}

/// Read-only lookup of credentials by username.
///
/// Built once at startup and never mutated; share it behind an `Arc`.
#[derive(Debug)]
pub struct CredentialStore {
    users: HashMap<Username, Credential>,
}

impl CredentialStore {
    /// Build the store, rejecting an empty table, blank fields and duplicates.
    pub fn new(credentials: Vec<Credential>) -> Result<Self, CredentialError> {
        if credentials.is_empty() {
            return Err(CredentialError::Empty);
        }

        let mut users = HashMap::with_capacity(credentials.len());
        for (idx, credential) in credentials.into_iter().enumerate() {
            if credential.username.is_blank() {
                return Err(CredentialError::MissingUsername(idx + 1));
            }
            if credential.password_hash.trim().is_empty() {
                return Err(CredentialError::MissingHash(
                    credential.username.into_inner(),
                ));
            }
            if users.contains_key(&credential.username) {
                return Err(CredentialError::Duplicate(
                    credential.username.into_inner(),
                ));
            }
            users.insert(credential.username.clone(), credential);
        }

        Ok(Self { users })
    }

    /// Look up a credential by exact username.
    pub fn get(&self, username: &str) -> Option<&Credential> {
        self.users.get(username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.users.values()
    }

    /// Usernames in sorted order, for startup logging.
    pub fn usernames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.users.keys().map(|u| u.as_str()).collect();
        names.sort_unstable();
        names
    }
}
