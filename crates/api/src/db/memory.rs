//! Process-local store.
//!
//! Mirrors the `PostgreSQL` constraints (unique email, one cart line per
//! `(owner, item)`, cascading deletes) so the service layer sees the same
//! behavior whichever backend is configured.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::RwLock;

use fitshop_core::{CartItemId, Email, ItemId, PermissionSet, UserId};

use super::{CartStore, ItemStore, RepositoryError, Store, UserStore};
use crate::models::{CartLine, Item, ItemUpdate, NewItem, NewUser, ResetCredential, User};

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
    reset: Option<ResetCredential>,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, UserRecord>,
    items: BTreeMap<ItemId, Item>,
    cart_items: BTreeMap<CartItemId, CartLine>,
    next_user_id: i32,
    next_item_id: i32,
    next_cart_item_id: i32,
}

impl Tables {
    fn user_by_email(&self, email: &Email) -> Option<&UserRecord> {
        self.users.values().find(|record| record.user.email == *email)
    }

    fn next_id(counter: &mut i32) -> i32 {
        *counter += 1;
        *counter
    }
}

/// In-memory [`Store`]. Cloning shares the underlying tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryStore {
    fn create_user(&self, new_user: NewUser) -> BoxFuture<'_, Result<User, RepositoryError>> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            if tables.user_by_email(&new_user.email).is_some() {
                return Err(RepositoryError::Conflict("email already exists".to_string()));
            }

            let now = Utc::now();
            let id = UserId::new(Tables::next_id(&mut tables.next_user_id));
            let user = User {
                id,
                email: new_user.email,
                name: new_user.name,
                permissions: new_user.permissions,
                created_at: now,
                updated_at: now,
            };
            tables.users.insert(
                id,
                UserRecord {
                    user: user.clone(),
                    password_hash: new_user.password_hash,
                    reset: None,
                },
            );
            Ok(user)
        })
    }

    fn find_user_by_id(&self, id: UserId) -> BoxFuture<'_, Result<Option<User>, RepositoryError>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            Ok(tables.users.get(&id).map(|record| record.user.clone()))
        })
    }

    fn find_user_by_email<'a>(
        &'a self,
        email: &'a Email,
    ) -> BoxFuture<'a, Result<Option<User>, RepositoryError>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            Ok(tables.user_by_email(email).map(|record| record.user.clone()))
        })
    }

    fn find_password_hash<'a>(
        &'a self,
        email: &'a Email,
    ) -> BoxFuture<'a, Result<Option<(User, String)>, RepositoryError>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            Ok(tables
                .user_by_email(email)
                .map(|record| (record.user.clone(), record.password_hash.clone())))
        })
    }

    fn list_users(&self) -> BoxFuture<'_, Result<Vec<User>, RepositoryError>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            Ok(tables.users.values().map(|record| record.user.clone()).collect())
        })
    }

    fn update_permissions<'a>(
        &'a self,
        id: UserId,
        permissions: &'a PermissionSet,
    ) -> BoxFuture<'a, Result<User, RepositoryError>> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let record = tables.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
            record.user.permissions = permissions.clone();
            record.user.updated_at = Utc::now();
            Ok(record.user.clone())
        })
    }

    fn set_reset_token<'a>(
        &'a self,
        id: UserId,
        credential: &'a ResetCredential,
    ) -> BoxFuture<'a, Result<(), RepositoryError>> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            if tables
                .users
                .values()
                .any(|r| r.user.id != id && r.reset.as_ref().is_some_and(|c| c.token == credential.token))
            {
                return Err(RepositoryError::Conflict("reset token already exists".to_string()));
            }
            let record = tables.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
            record.reset = Some(credential.clone());
            record.user.updated_at = Utc::now();
            Ok(())
        })
    }

    fn find_user_by_reset_token<'a>(
        &'a self,
        token: &'a str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<Option<User>, RepositoryError>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            Ok(tables
                .users
                .values()
                .find(|record| {
                    record
                        .reset
                        .as_ref()
                        .is_some_and(|c| c.token == token && c.is_live_at(now))
                })
                .map(|record| record.user.clone()))
        })
    }

    fn complete_password_reset<'a>(
        &'a self,
        id: UserId,
        token: &'a str,
        password_hash: &'a str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<Option<User>, RepositoryError>> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let Some(record) = tables.users.get_mut(&id) else {
                return Ok(None);
            };
            if !record
                .reset
                .as_ref()
                .is_some_and(|c| c.token == token && c.is_live_at(now))
            {
                return Ok(None);
            }
            record.password_hash = password_hash.to_string();
            record.reset = None;
            record.user.updated_at = Utc::now();
            Ok(Some(record.user.clone()))
        })
    }
}

impl ItemStore for MemoryStore {
    fn create_item(&self, new_item: NewItem) -> BoxFuture<'_, Result<Item, RepositoryError>> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            if !tables.users.contains_key(&new_item.owner_id) {
                return Err(RepositoryError::NotFound);
            }

            let now = Utc::now();
            let id = ItemId::new(Tables::next_id(&mut tables.next_item_id));
            let item = Item {
                id,
                owner_id: new_item.owner_id,
                title: new_item.title,
                description: new_item.description,
                price: new_item.price,
                image: new_item.image,
                large_image: new_item.large_image,
                created_at: now,
                updated_at: now,
            };
            tables.items.insert(id, item.clone());
            Ok(item)
        })
    }

    fn find_item(&self, id: ItemId) -> BoxFuture<'_, Result<Option<Item>, RepositoryError>> {
        Box::pin(async move { Ok(self.tables.read().await.items.get(&id).cloned()) })
    }

    fn list_items(&self) -> BoxFuture<'_, Result<Vec<Item>, RepositoryError>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            let mut items: Vec<Item> = tables.items.values().cloned().collect();
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(items)
        })
    }

    fn update_item<'a>(
        &'a self,
        id: ItemId,
        update: &'a ItemUpdate,
    ) -> BoxFuture<'a, Result<Option<Item>, RepositoryError>> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let Some(item) = tables.items.get_mut(&id) else {
                return Ok(None);
            };
            update.apply_to(item);
            item.updated_at = Utc::now();
            Ok(Some(item.clone()))
        })
    }

    fn delete_item(&self, id: ItemId) -> BoxFuture<'_, Result<Option<Item>, RepositoryError>> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let removed = tables.items.remove(&id);
            if removed.is_some() {
                tables.cart_items.retain(|_, line| line.item_id != id);
            }
            Ok(removed)
        })
    }
}

impl CartStore for MemoryStore {
    fn add_or_increment_cart_item(
        &self,
        owner: UserId,
        item: ItemId,
    ) -> BoxFuture<'_, Result<CartLine, RepositoryError>> {
        Box::pin(async move {
            // One write guard covers the lookup and the insert.
            let mut tables = self.tables.write().await;
            if !tables.users.contains_key(&owner) || !tables.items.contains_key(&item) {
                return Err(RepositoryError::NotFound);
            }

            if let Some(line) = tables
                .cart_items
                .values_mut()
                .find(|line| line.owner_id == owner && line.item_id == item)
            {
                line.quantity += 1;
                return Ok(line.clone());
            }

            let id = CartItemId::new(Tables::next_id(&mut tables.next_cart_item_id));
            let line = CartLine {
                id,
                owner_id: owner,
                item_id: item,
                quantity: 1,
                created_at: Utc::now(),
            };
            tables.cart_items.insert(id, line.clone());
            Ok(line)
        })
    }

    fn find_cart_item(
        &self,
        id: CartItemId,
    ) -> BoxFuture<'_, Result<Option<CartLine>, RepositoryError>> {
        Box::pin(async move { Ok(self.tables.read().await.cart_items.get(&id).cloned()) })
    }

    fn list_cart_items(&self, owner: UserId) -> BoxFuture<'_, Result<Vec<CartLine>, RepositoryError>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            Ok(tables
                .cart_items
                .values()
                .filter(|line| line.owner_id == owner)
                .cloned()
                .collect())
        })
    }

    fn delete_cart_item(
        &self,
        id: CartItemId,
    ) -> BoxFuture<'_, Result<Option<CartLine>, RepositoryError>> {
        Box::pin(async move { Ok(self.tables.write().await.cart_items.remove(&id)) })
    }
}

impl Store for MemoryStore {
    fn ping(&self) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use fitshop_core::Permission;

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: Email::parse(email).unwrap(),
            name: "Test".to_string(),
            password_hash: "hash".to_string(),
            permissions: PermissionSet::signup_default(),
        }
    }

    fn new_item(owner_id: UserId) -> NewItem {
        NewItem {
            owner_id,
            title: "Shoes".to_string(),
            description: "Running shoes".to_string(),
            price: 5000,
            image: None,
            large_image: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@x.com")).await.unwrap();

        let result = store.create_user(new_user("A@X.com")).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_find_password_hash() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@x.com")).await.unwrap();

        let (found, hash) = store
            .find_password_hash(&user.email)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(hash, "hash");
    }

    #[tokio::test]
    async fn test_update_permissions_missing_user() {
        let store = MemoryStore::new();
        let perms = PermissionSet::from_iter([Permission::Admin]);

        let result = store.update_permissions(UserId::new(99), &perms).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_cart_upsert_increments() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@x.com")).await.unwrap();
        let item = store.create_item(new_item(user.id)).await.unwrap();

        let first = store.add_or_increment_cart_item(user.id, item.id).await.unwrap();
        let second = store.add_or_increment_cart_item(user.id, item.id).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 2);
        assert_eq!(store.list_cart_items(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_cart_adds_keep_one_line() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@x.com")).await.unwrap();
        let item = store.create_item(new_item(user.id)).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.add_or_increment_cart_item(user.id, item.id).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let lines = store.list_cart_items(user.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 8);
    }

    #[tokio::test]
    async fn test_cart_add_unknown_item() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@x.com")).await.unwrap();

        let result = store.add_or_increment_cart_item(user.id, ItemId::new(7)).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_item_cascades_to_cart() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@x.com")).await.unwrap();
        let item = store.create_item(new_item(user.id)).await.unwrap();
        store.add_or_increment_cart_item(user.id, item.id).await.unwrap();

        store.delete_item(item.id).await.unwrap().unwrap();
        assert!(store.list_cart_items(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_token_lookup_respects_expiry() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@x.com")).await.unwrap();
        let issued = Utc::now();
        let credential = ResetCredential::issued_at("ab".repeat(20), issued);
        store.set_reset_token(user.id, &credential).await.unwrap();

        let at_edge = store
            .find_user_by_reset_token(&credential.token, issued + Duration::seconds(3600))
            .await
            .unwrap();
        assert!(at_edge.is_some());

        let late = store
            .find_user_by_reset_token(&credential.token, issued + Duration::seconds(3601))
            .await
            .unwrap();
        assert!(late.is_none());
    }

    #[tokio::test]
    async fn test_complete_password_reset_is_single_use() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@x.com")).await.unwrap();
        let now = Utc::now();
        let credential = ResetCredential::issued_at("cd".repeat(20), now);
        store.set_reset_token(user.id, &credential).await.unwrap();

        let first = store
            .complete_password_reset(user.id, &credential.token, "new-hash", now)
            .await
            .unwrap();
        assert!(first.is_some());

        let second = store
            .complete_password_reset(user.id, &credential.token, "other-hash", now)
            .await
            .unwrap();
        assert!(second.is_none());

        let (_, hash) = store.find_password_hash(&user.email).await.unwrap().unwrap();
        assert_eq!(hash, "new-hash");
    }

    #[tokio::test]
    async fn test_complete_password_reset_rejects_token_expired_since_lookup() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@x.com")).await.unwrap();
        let issued = Utc::now();
        let credential = ResetCredential::issued_at("ef".repeat(20), issued);
        store.set_reset_token(user.id, &credential).await.unwrap();

        let looked_up = store
            .find_user_by_reset_token(&credential.token, issued + Duration::seconds(3600))
            .await
            .unwrap();
        assert!(looked_up.is_some());

        let completed = store
            .complete_password_reset(
                user.id,
                &credential.token,
                "new-hash",
                issued + Duration::seconds(3601),
            )
            .await
            .unwrap();
        assert!(completed.is_none());

        let (_, hash) = store.find_password_hash(&user.email).await.unwrap().unwrap();
        assert_eq!(hash, "hash");
    }
}
