//! Authenticated identity handed back by a successful login.

use crate::types::{Role, Username};
use serde::{Deserialize, Serialize};

/// Who a caller proved to be at login time.
///
/// Immutable once created. Only the username ends up in the token; the role is
/// available to the login handler for logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    username: Username,
    role: Role,
}

impl Identity {
    pub fn new(username: Username, role: Role) -> Self {
        Self { username, role }
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Consume and return the username, e.g. to use as a token subject.
    pub fn into_username(self) -> Username {
        self.username
    }
}
