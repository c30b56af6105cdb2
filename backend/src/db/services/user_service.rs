use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::db::models::User;

pub const SEED_ADMIN_EMAIL: &str = "admin@test.com";
// bcrypt, cost 10.
pub const SEED_ADMIN_PASSWORD_HASH: &str =
    "$2a$10$92IXUNpkjO0rOQ5byMi.Ye4oKoEa3Ro9llC/.og/at2.uheWG/igi";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Email already registered: {0}")]
    EmailTaken(String),
    #[error("User id space exhausted")]
    IdSpaceExhausted,
}

/// Lookup and registration of portal accounts.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Option<User>;
    async fn find_by_id(&self, id: i32) -> Option<User>;
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;
}

#[derive(Debug)]
struct UserTable {
    users: HashMap<i32, User>,
    next_id: i32,
}

#[derive(Debug)]
pub struct InMemoryCredentialStore {
    inner: RwLock<UserTable>,
}

impl InMemoryCredentialStore {
    /// An empty store. Ids start at 1.
    pub fn empty() -> Self {
        InMemoryCredentialStore {
            inner: RwLock::new(UserTable {
                users: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// A store holding only the admin account.
    pub fn seeded() -> Self {
        let mut users = HashMap::new();
        users.insert(
            1,
            User {
                id: 1,
                email: SEED_ADMIN_EMAIL.to_string(),
                password_hash: SEED_ADMIN_PASSWORD_HASH.to_string(),
            },
        );
        InMemoryCredentialStore {
            inner: RwLock::new(UserTable { users, next_id: 2 }),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::seeded()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Option<User> {
        let table = self.inner.read().await;
        table.users.values().find(|u| u.email == email).cloned()
    }

    async fn find_by_id(&self, id: i32) -> Option<User> {
        self.inner.read().await.users.get(&id).cloned()
    }

    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut table = self.inner.write().await;
        if table.users.values().any(|u| u.email == email) {
            return Err(StoreError::EmailTaken(email.to_string()));
        }

        let id = table.next_id;
        table.next_id = id.checked_add(1).ok_or(StoreError::IdSpaceExhausted)?;

        let user = User {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        table.users.insert(id, user.clone());
        debug!(user_id = id, "Inserted user.");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_store_has_admin() {
        let store = InMemoryCredentialStore::seeded();
        assert_eq!(store.len().await, 1);

        let admin = store.find_by_email(SEED_ADMIN_EMAIL).await.unwrap();
        assert_eq!(admin.id, 1);
        assert_eq!(admin.password_hash, SEED_ADMIN_PASSWORD_HASH);
        assert_eq!(store.find_by_id(1).await, Some(admin));
    }

    #[tokio::test]
    async fn test_lookup_unknown_email() {
        let store = InMemoryCredentialStore::seeded();
        assert!(store.find_by_email("nobody@test.com").await.is_none());
        assert!(store.find_by_email("ADMIN@test.com").await.is_none());
        assert!(store.find_by_id(42).await.is_none());
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryCredentialStore::seeded();
        let a = store.insert_user("a@test.com", "hash-a").await.unwrap();
        let b = store.insert_user("b@test.com", "hash-b").await.unwrap();
        assert_eq!(a.id, 2);
        assert_eq!(b.id, 3);
        assert_eq!(store.find_by_email("b@test.com").await.unwrap().id, 3);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_email() {
        let store = InMemoryCredentialStore::seeded();
        let err = store
            .insert_user(SEED_ADMIN_EMAIL, "other-hash")
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::EmailTaken(SEED_ADMIN_EMAIL.to_string()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_empty_store_starts_at_one() {
        let store = InMemoryCredentialStore::empty();
        let user = store.insert_user("first@test.com", "h").await.unwrap();
        assert_eq!(user.id, 1);
    }
}
