use serde::{Deserialize, Serialize};

use crate::types::Username;

/// Client-supplied item fields for create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPayload {
    /// Name of the item (required, non-blank).
    pub name: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

impl ItemPayload {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// A stored item, tagged with the user who created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub description: Option<String>,
    /// Creator of the item. Never changes after insert.
    pub owner: Username,
}

impl Item {
    pub(crate) fn from_payload(payload: ItemPayload, owner: Username) -> Self {
        Self {
            name: payload.name,
            description: payload.description,
            owner,
        }
    }

    pub fn is_owned_by(&self, user: &Username) -> bool {
        &self.owner == user
    }
}
