use std::collections::HashMap;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ApiError;

/// User record. The argon2 hash never leaves the process.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Default)]
struct UserMap {
    by_id: HashMap<Uuid, User>,
    id_by_email: HashMap<String, Uuid>,
    id_by_name: HashMap<String, Uuid>,
}

/// Identity store. Registration checks both uniqueness indexes and
/// inserts under a single write lock, so two concurrent registrations
/// with the same name or e-mail cannot both succeed.
#[derive(Default)]
pub struct UserStore {
    inner: RwLock<UserMap>,
}

impl UserStore {
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        let mut map = self.inner.write().await;
        if map.id_by_email.contains_key(email) {
            return Err(ApiError::DuplicateEmail(email.to_string()));
        }
        if map.id_by_name.contains_key(name) {
            return Err(ApiError::DuplicateUsername(name.to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        map.id_by_email.insert(user.email.clone(), user.id);
        map.id_by_name.insert(user.name.clone(), user.id);
        map.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        let map = self.inner.read().await;
        map.id_by_email
            .get(email)
            .and_then(|id| map.by_id.get(id))
            .cloned()
    }

    pub async fn get(&self, id: Uuid) -> Result<User, ApiError> {
        self.inner
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or(ApiError::UserNotFound)
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.inner.read().await.by_id.contains_key(&id)
    }

    /// Fails `UserNotFound` unless every id is a registered user.
    pub async fn ensure_exist(&self, ids: [Uuid; 2]) -> Result<(), ApiError> {
        let map = self.inner.read().await;
        if ids.iter().all(|id| map.by_id.contains_key(id)) {
            Ok(())
        } else {
            Err(ApiError::UserNotFound)
        }
    }

    pub async fn resolve_name(&self, id: Uuid) -> Result<String, ApiError> {
        Ok(self.get(id).await?.name)
    }

    pub async fn resolve_id(&self, name: &str) -> Result<Uuid, ApiError> {
        self.inner
            .read()
            .await
            .id_by_name
            .get(name)
            .copied()
            .ok_or(ApiError::UserNotFound)
    }

    /// All users, ordered by name for stable output.
    pub async fn list_all(&self) -> Vec<User> {
        let map = self.inner.read().await;
        let mut users: Vec<User> = map.by_id.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        users
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn register_and_resolve_both_directions() {
        let store = UserStore::default();
        let user = store
            .register("alice", "alice@example.com", "hash")
            .await
            .expect("register");
        assert_eq!(store.resolve_name(user.id).await.unwrap(), "alice");
        assert_eq!(store.resolve_id("alice").await.unwrap(), user.id);
    }

    #[tokio::test]
    async fn duplicate_email_and_username_are_rejected() {
        let store = UserStore::default();
        store
            .register("alice", "alice@example.com", "hash")
            .await
            .unwrap();

        let err = store
            .register("bob", "alice@example.com", "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateEmail(_)));

        let err = store
            .register("alice", "other@example.com", "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateUsername(_)));
    }

    #[tokio::test]
    async fn concurrent_registrations_admit_one_winner() {
        let store = Arc::new(UserStore::default());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .register(&format!("user{i}"), "same@example.com", "hash")
                    .await
            }));
        }
        let mut wins = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn ensure_exist_requires_both_users() {
        let store = UserStore::default();
        let a = store
            .register("alice", "alice@example.com", "hash")
            .await
            .unwrap()
            .id;
        let b = store
            .register("bob", "bob@example.com", "hash")
            .await
            .unwrap()
            .id;
        store.ensure_exist([a, b]).await.unwrap();
        assert!(matches!(
            store.ensure_exist([a, Uuid::new_v4()]).await.unwrap_err(),
            ApiError::UserNotFound
        ));
    }

    #[tokio::test]
    async fn unknown_lookups_fail_not_found() {
        let store = UserStore::default();
        assert!(matches!(
            store.resolve_name(Uuid::new_v4()).await.unwrap_err(),
            ApiError::UserNotFound
        ));
        assert!(matches!(
            store.resolve_id("nobody").await.unwrap_err(),
            ApiError::UserNotFound
        ));
    }
}
