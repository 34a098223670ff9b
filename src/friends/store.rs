use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ApiError;

/// State of the single record kept per unordered user pair. A pending
/// request remembers who sent it; acceptance makes the pair symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Friendship {
    Pending { sender: Uuid },
    Accepted,
}

/// Normalized map key: smaller id first, so (A,B) and (B,A) collide.
fn pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Social graph. One record per pair, guarded by a single reader-writer
/// lock: fan-out reads run shared, the mutations are brief point updates.
#[derive(Default)]
pub struct SocialGraph {
    inner: RwLock<HashMap<(Uuid, Uuid), Friendship>>,
}

impl SocialGraph {
    /// Creates a pending request from `sender` to `receiver`. A crossing
    /// request (receiver already requested sender) is rejected as
    /// `RequestAlreadyPending` rather than auto-accepted; acceptance is
    /// always an explicit action.
    pub async fn request(&self, sender: Uuid, receiver: Uuid) -> Result<(), ApiError> {
        if sender == receiver {
            return Err(ApiError::SelfFriendRequest);
        }
        let mut map = self.inner.write().await;
        match map.get(&pair(sender, receiver)) {
            Some(Friendship::Accepted) => Err(ApiError::AlreadyFriends),
            Some(Friendship::Pending { .. }) => Err(ApiError::RequestAlreadyPending),
            None => {
                map.insert(pair(sender, receiver), Friendship::Pending { sender });
                Ok(())
            }
        }
    }

    /// Accepts the pending request sent by `sender` to `receiver`. The
    /// direction must match the stored record exactly.
    pub async fn accept(&self, sender: Uuid, receiver: Uuid) -> Result<(), ApiError> {
        let mut map = self.inner.write().await;
        let key = pair(sender, receiver);
        match map.get(&key) {
            Some(Friendship::Pending { sender: s }) if *s == sender => {
                map.insert(key, Friendship::Accepted);
                Ok(())
            }
            _ => Err(ApiError::NoSuchRequest),
        }
    }

    /// Removes the pending request sent by `sender` to `receiver`.
    /// Idempotent: rejecting an absent request succeeds as a no-op.
    pub async fn reject(&self, sender: Uuid, receiver: Uuid) {
        let mut map = self.inner.write().await;
        let key = pair(sender, receiver);
        if let Some(Friendship::Pending { sender: s }) = map.get(&key) {
            if *s == sender {
                map.remove(&key);
            }
        }
    }

    pub async fn are_friends(&self, a: Uuid, b: Uuid) -> bool {
        matches!(
            self.inner.read().await.get(&pair(a, b)),
            Some(Friendship::Accepted)
        )
    }

    /// Accepted friends of `user`.
    pub async fn list_friends(&self, user: Uuid) -> Vec<Uuid> {
        let map = self.inner.read().await;
        let mut out: Vec<Uuid> = map
            .iter()
            .filter(|(_, state)| **state == Friendship::Accepted)
            .filter_map(|((a, b), _)| {
                if *a == user {
                    Some(*b)
                } else if *b == user {
                    Some(*a)
                } else {
                    None
                }
            })
            .collect();
        out.sort();
        out
    }

    /// Senders of pending requests directed at `user`.
    pub async fn list_pending_incoming(&self, user: Uuid) -> Vec<Uuid> {
        let map = self.inner.read().await;
        let mut out: Vec<Uuid> = map
            .iter()
            .filter_map(|((a, b), state)| match state {
                Friendship::Pending { sender } if (*a == user || *b == user) && *sender != user => {
                    Some(*sender)
                }
                _ => None,
            })
            .collect();
        out.sort();
        out
    }
}
