//! In-memory, ownership-tagged item store.
//!
//! All items live in one map behind a `tokio::sync::RwLock`. Reads share the
//! lock; every mutation holds the write lock across its existence and
//! ownership checks, so two writers on the same key can never interleave.
//! Nothing is persisted across restarts.

mod item;

pub use item::{Item, ItemPayload};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::types::{ItemKey, Username};

/// Errors returned by item store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Create on a key that is already taken.
    #[error("Item exists: {0}")]
    Conflict(ItemKey),

    /// Operation on a key that is not present.
    #[error("Item not found: {0}")]
    NotFound(ItemKey),

    /// Mutation by someone other than the item's owner.
    #[error("{caller} is not the owner of item {key}")]
    Forbidden { key: ItemKey, caller: Username },

    /// Payload failed validation (blank name).
    #[error("Invalid item: {0}")]
    InvalidItem(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Shared item store. Cheap to clone; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    items: Arc<RwLock<HashMap<ItemKey, Item>>>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new item owned by `owner`. Never overwrites.
    pub async fn create(
        &self,
        key: ItemKey,
        payload: ItemPayload,
        owner: &Username,
    ) -> StoreResult<()> {
        validate(&payload)?;
        if owner.is_blank() {
            return Err(StoreError::InvalidItem("owner is empty".to_string()));
        }

        let mut items = self.items.write().await;
        if items.contains_key(&key) {
            debug!("Create of existing item {} by {} rejected", key, owner);
            return Err(StoreError::Conflict(key));
        }

        debug!("Item {} created by {}", key, owner);
        items.insert(key, Item::from_payload(payload, owner.clone()));
        Ok(())
    }

    /// Fetch one item. No ownership check.
    pub async fn read(&self, key: &ItemKey) -> StoreResult<Item> {
        self.items
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    /// Replace name and description of an item the caller owns.
    ///
    /// Returns the updated item; the owner is preserved.
    pub async fn update(
        &self,
        key: &ItemKey,
        payload: ItemPayload,
        caller: &Username,
    ) -> StoreResult<Item> {
        validate(&payload)?;

        let mut items = self.items.write().await;
        let item = items
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        check_owner(key, item, caller)?;

        item.name = payload.name;
        item.description = payload.description;
        debug!("Item {} updated by {}", key, caller);
        Ok(item.clone())
    }

    /// Remove an item the caller owns, returning it.
    pub async fn delete(&self, key: &ItemKey, caller: &Username) -> StoreResult<Item> {
        let mut items = self.items.write().await;
        let item = items
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        check_owner(key, item, caller)?;

        debug!("Item {} deleted by {}", key, caller);
        items
            .remove(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    /// Snapshot of every item, ordered by key.
    pub async fn list(&self) -> BTreeMap<ItemKey, Item> {
        self.items
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

fn validate(payload: &ItemPayload) -> StoreResult<()> {
    if payload.is_valid() {
        Ok(())
    } else {
        Err(StoreError::InvalidItem("name must not be empty".to_string()))
    }
}

// Exact username comparison; roles never bypass ownership.
fn check_owner(key: &ItemKey, item: &Item, caller: &Username) -> StoreResult<()> {
    if item.is_owned_by(caller) {
        return Ok(());
    }
    warn!(
        "{} attempted to modify item {} owned by {}",
        caller, key, item.owner
    );
    Err(StoreError::Forbidden {
        key: key.clone(),
        caller: caller.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str) -> ItemKey {
        ItemKey::new(k)
    }

    fn user(u: &str) -> Username {
        Username::new(u)
    }

    fn widget() -> ItemPayload {
        ItemPayload::new("Widget", Some("A widget".to_string()))
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let store = ItemStore::new();
        store.create(key("a"), widget(), &user("u1")).await.unwrap();

        let item = store.read(&key("a")).await.unwrap();
        assert_eq!(item.name, "Widget");
        assert_eq!(item.description.as_deref(), Some("A widget"));
        assert_eq!(item.owner, user("u1"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let store = ItemStore::new();
        store.create(key("a"), widget(), &user("u1")).await.unwrap();

        let err = store
            .create(key("a"), ItemPayload::new("Other", None), &user("u2"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Conflict(key("a")));

        // Original record untouched.
        let item = store.read(&key("a")).await.unwrap();
        assert_eq!(item.name, "Widget");
        assert_eq!(item.owner, user("u1"));
    }

    #[tokio::test]
    async fn test_read_missing() {
        let store = ItemStore::new();
        assert_eq!(
            store.read(&key("missing")).await.unwrap_err(),
            StoreError::NotFound(key("missing"))
        );
    }

    #[tokio::test]
    async fn test_update_by_owner_keeps_owner() {
        let store = ItemStore::new();
        store.create(key("a"), widget(), &user("u1")).await.unwrap();

        let updated = store
            .update(&key("a"), ItemPayload::new("Gadget", None), &user("u1"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Gadget");
        assert_eq!(updated.description, None);
        assert_eq!(updated.owner, user("u1"));
        assert_eq!(store.read(&key("a")).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_by_non_owner_forbidden() {
        let store = ItemStore::new();
        store.create(key("a"), widget(), &user("u1")).await.unwrap();

        let err = store
            .update(&key("a"), ItemPayload::new("Hijacked", None), &user("u2"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Forbidden {
                key: key("a"),
                caller: user("u2")
            }
        );
        assert_eq!(store.read(&key("a")).await.unwrap().name, "Widget");
    }

    #[tokio::test]
    async fn test_update_missing() {
        let store = ItemStore::new();
        assert_eq!(
            store
                .update(&key("x"), widget(), &user("u1"))
                .await
                .unwrap_err(),
            StoreError::NotFound(key("x"))
        );
    }

    #[tokio::test]
    async fn test_delete_lifecycle() {
        let store = ItemStore::new();
        store.create(key("a"), widget(), &user("u1")).await.unwrap();

        assert!(matches!(
            store.delete(&key("a"), &user("u2")).await,
            Err(StoreError::Forbidden { .. })
        ));
        assert!(store.read(&key("a")).await.is_ok());

        let removed = store.delete(&key("a"), &user("u1")).await.unwrap();
        assert_eq!(removed.owner, user("u1"));
        assert_eq!(
            store.read(&key("a")).await.unwrap_err(),
            StoreError::NotFound(key("a"))
        );
        assert_eq!(
            store.delete(&key("a"), &user("u1")).await.unwrap_err(),
            StoreError::NotFound(key("a"))
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_recreate_after_delete_takes_new_owner() {
        let store = ItemStore::new();
        store.create(key("a"), widget(), &user("u1")).await.unwrap();
        store.delete(&key("a"), &user("u1")).await.unwrap();

        store.create(key("a"), widget(), &user("u2")).await.unwrap();
        assert_eq!(store.read(&key("a")).await.unwrap().owner, user("u2"));
        assert!(store.update(&key("a"), widget(), &user("u1")).await.is_err());
    }

    #[tokio::test]
    async fn test_ownership_is_exact_match() {
        let store = ItemStore::new();
        store.create(key("a"), widget(), &user("sajan")).await.unwrap();
        for caller in ["Sajan", "sajan ", "sajal", ""] {
            assert!(
                store.delete(&key("a"), &user(caller)).await.is_err(),
                "{:?} deleted sajan's item",
                caller
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_payload_rejected() {
        let store = ItemStore::new();
        assert!(matches!(
            store
                .create(key("a"), ItemPayload::new(" ", None), &user("u1"))
                .await,
            Err(StoreError::InvalidItem(_))
        ));
        assert!(matches!(
            store.create(key("a"), widget(), &user("")).await,
            Err(StoreError::InvalidItem(_))
        ));
        assert!(store.is_empty().await);

        store.create(key("a"), widget(), &user("u1")).await.unwrap();
        assert!(matches!(
            store
                .update(&key("a"), ItemPayload::new("", None), &user("u1"))
                .await,
            Err(StoreError::InvalidItem(_))
        ));
    }

    #[tokio::test]
    async fn test_list_returns_everything_sorted() {
        let store = ItemStore::new();
        store.create(key("b"), widget(), &user("u1")).await.unwrap();
        store.create(key("a"), widget(), &user("u2")).await.unwrap();
        store.create(key("42"), widget(), &user("u1")).await.unwrap();

        let all = store.list().await;
        let keys: Vec<&str> = all.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["42", "a", "b"]);
        assert_eq!(all[&key("a")].owner, user("u2"));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = ItemStore::new();
        let other = store.clone();
        store.create(key("a"), widget(), &user("u1")).await.unwrap();
        assert!(other.read(&key("a")).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_single_winner() {
        let store = ItemStore::new();
        let n = 64;

        let handles: Vec<_> = (0..n)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create(
                            key("contested"),
                            ItemPayload::new(format!("item-{}", i), None),
                            &user(&format!("u{}", i)),
                        )
                        .await
                })
            })
            .collect();

        let mut ok = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(StoreError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(conflicts, n - 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_are_not_torn() {
        let store = ItemStore::new();
        store.create(key("a"), widget(), &user("u1")).await.unwrap();

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let label = format!("v{}", i);
                    store
                        .update(
                            &key("a"),
                            ItemPayload::new(label.clone(), Some(label)),
                            &user("u1"),
                        )
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let item = store.read(&key("a")).await.unwrap();
        assert_eq!(Some(item.name.clone()), item.description);
        assert_eq!(item.owner, user("u1"));
    }
}
