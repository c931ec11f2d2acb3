//! NewType wrappers for the identifiers that flow between auth and the store.
//!
//! Usernames, roles and item keys are all plain strings on the wire; wrapping
//! them keeps an item key from being passed where an owner is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate a NewType wrapper with standard trait implementations.
macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }

            /// True when the value is empty or only whitespace.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(
    /// Login name of a provisioned user.
    ///
    /// Doubles as the token subject claim and as the owner tag on items, so
    /// ownership checks are exact comparisons of this value.
    Username
);

newtype_string!(
    /// Role attached to a provisioned user (e.g. "admin", "user").
    ///
    /// Informational only: no role bypasses item ownership.
    Role
);

newtype_string!(
    /// Caller-supplied item identifier taken from the request path.
    ///
    /// Integer identifiers are stored as their decimal string, so `42` and
    /// `"42"` address the same item.
    ItemKey
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newtype_conversions() {
        let user = Username::new("sajan");
        assert_eq!(user.as_str(), "sajan");
        assert_eq!(user.to_string(), "sajan");
        assert_eq!(Username::from("sajan"), user);
        assert_eq!(user.clone().into_inner(), "sajan".to_string());
    }

    #[test]
    fn test_is_blank() {
        assert!(Username::new("").is_blank());
        assert!(Username::new("  \t").is_blank());
        assert!(!Username::new("a").is_blank());
    }

    #[test]
    fn test_serde_is_transparent() {
        let key = ItemKey::new("42");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"42\"");
        let parsed: ItemKey = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_borrow_allows_str_lookup() {
        let mut map = std::collections::HashMap::new();
        map.insert(ItemKey::new("a"), 1);
        assert_eq!(map.get("a"), Some(&1));
    }
}
