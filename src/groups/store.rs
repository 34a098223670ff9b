use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub members: BTreeSet<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Group store. The outer lock guards the id map; each group sits behind
/// its own mutex so membership changes to one group never block another.
#[derive(Default)]
pub struct GroupStore {
    inner: RwLock<HashMap<Uuid, Arc<Mutex<Group>>>>,
}

impl GroupStore {
    pub async fn create(&self, name: &str, members: BTreeSet<Uuid>) -> Result<Group, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::EmptyGroupName);
        }
        if members.is_empty() {
            return Err(ApiError::EmptyMembership);
        }
        let group = Group {
            id: Uuid::new_v4(),
            name: name.to_string(),
            members,
            created_at: OffsetDateTime::now_utc(),
        };
        self.inner
            .write()
            .await
            .insert(group.id, Arc::new(Mutex::new(group.clone())));
        Ok(group)
    }

    async fn entry(&self, group_id: Uuid) -> Result<Arc<Mutex<Group>>, ApiError> {
        self.inner
            .read()
            .await
            .get(&group_id)
            .cloned()
            .ok_or(ApiError::GroupNotFound)
    }

    /// Adds a member. Adding an existing member is a successful no-op.
    pub async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> Result<Group, ApiError> {
        let entry = self.entry(group_id).await?;
        let mut group = entry.lock().await;
        group.members.insert(user_id);
        Ok(group.clone())
    }

    pub async fn get(&self, group_id: Uuid) -> Result<Group, ApiError> {
        let entry = self.entry(group_id).await?;
        let group = entry.lock().await;
        Ok(group.clone())
    }

    pub async fn members(&self, group_id: Uuid) -> Result<BTreeSet<Uuid>, ApiError> {
        Ok(self.get(group_id).await?.members)
    }

    /// Groups the user belongs to, oldest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Vec<Group> {
        let entries: Vec<Arc<Mutex<Group>>> =
            self.inner.read().await.values().cloned().collect();
        let mut groups = Vec::new();
        for entry in entries {
            let group = entry.lock().await;
            if group.members.contains(&user_id) {
                groups.push(group.clone());
            }
        }
        groups.sort_by_key(|g| g.created_at);
        groups
    }
}
