//! Messaging service: validates sender identity, friendship and group
//! membership, then delegates to the conversation store. All ordering
//! decisions belong to the store; everything here is authorization and
//! validation.

use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use crate::{
    error::ApiError,
    messages::store::{ConversationKey, Message},
    state::AppState,
};

fn non_blank(content: &str) -> Result<&str, ApiError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ApiError::EmptyContent);
    }
    Ok(trimmed)
}

async fn ensure_member(state: &AppState, user: Uuid, group_id: Uuid) -> Result<(), ApiError> {
    let members = state.groups.members(group_id).await?;
    if !members.contains(&user) {
        return Err(ApiError::NotGroupMember);
    }
    Ok(())
}

pub async fn send_direct(
    state: &AppState,
    sender: Uuid,
    receiver: Uuid,
    content: &str,
) -> Result<Message, ApiError> {
    let content = non_blank(content)?;
    state.users.ensure_exist([sender, receiver]).await?;
    if !state.friends.are_friends(sender, receiver).await {
        return Err(ApiError::NotFriends);
    }
    let message = state
        .conversations
        .append(ConversationKey::direct(sender, receiver), sender, content)
        .await;
    info!(sender = %sender, receiver = %receiver, seq = message.seq, "direct message sent");
    Ok(message)
}

pub async fn send_group(
    state: &AppState,
    sender: Uuid,
    group_id: Uuid,
    content: &str,
) -> Result<Message, ApiError> {
    let content = non_blank(content)?;
    ensure_member(state, sender, group_id).await?;
    let message = state
        .conversations
        .append(ConversationKey::group(group_id), sender, content)
        .await;
    info!(sender = %sender, group_id = %group_id, seq = message.seq, "group message sent");
    Ok(message)
}

pub async fn fetch_direct(
    state: &AppState,
    a: Uuid,
    b: Uuid,
) -> Result<Vec<Message>, ApiError> {
    state.users.ensure_exist([a, b]).await?;
    Ok(state.conversations.list(ConversationKey::direct(a, b)).await)
}

/// Group history. The viewer is optional: the mobile client requests
/// history with the group id alone, but when a viewer is named it must
/// be a member.
pub async fn fetch_group(
    state: &AppState,
    viewer: Option<Uuid>,
    group_id: Uuid,
) -> Result<Vec<Message>, ApiError> {
    match viewer {
        Some(viewer) => ensure_member(state, viewer, group_id).await?,
        None => {
            state.groups.get(group_id).await?;
        }
    }
    Ok(state.conversations.list(ConversationKey::group(group_id)).await)
}

pub async fn poll_direct(
    state: &AppState,
    user: Uuid,
    peer: Uuid,
    after_seq: u64,
) -> Result<Vec<Message>, ApiError> {
    state.users.ensure_exist([user, peer]).await?;
    let timeout = Duration::from_secs(state.config.poll_timeout_secs);
    Ok(state
        .conversations
        .wait_beyond(ConversationKey::direct(user, peer), after_seq, timeout)
        .await)
}

pub async fn poll_group(
    state: &AppState,
    user: Uuid,
    group_id: Uuid,
    after_seq: u64,
) -> Result<Vec<Message>, ApiError> {
    ensure_member(state, user, group_id).await?;
    let timeout = Duration::from_secs(state.config.poll_timeout_secs);
    Ok(state
        .conversations
        .wait_beyond(ConversationKey::group(group_id), after_seq, timeout)
        .await)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    async fn registered(state: &AppState, name: &str) -> Uuid {
        state
            .users
            .register(name, &format!("{name}@example.com"), "hash")
            .await
            .expect("register")
            .id
    }

    async fn befriend(state: &AppState, a: Uuid, b: Uuid) {
        state.friends.request(a, b).await.unwrap();
        state.friends.accept(a, b).await.unwrap();
    }

    #[tokio::test]
    async fn direct_send_requires_friendship() {
        let state = AppState::fake();
        let a = registered(&state, "alice").await;
        let c = registered(&state, "carol").await;

        let err = send_direct(&state, c, a, "x").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFriends));
    }

    #[tokio::test]
    async fn direct_send_and_fetch_roundtrip() {
        let state = AppState::fake();
        let a = registered(&state, "alice").await;
        let b = registered(&state, "bob").await;
        befriend(&state, a, b).await;

        send_direct(&state, a, b, "hi").await.unwrap();

        let conv = fetch_direct(&state, a, b).await.unwrap();
        assert_eq!(conv.len(), 1);
        assert_eq!(conv[0].content, "hi");
        assert_eq!(conv[0].sender_id, a);
        // Same log regardless of which side asks.
        let conv = fetch_direct(&state, b, a).await.unwrap();
        assert_eq!(conv.len(), 1);
    }

    #[tokio::test]
    async fn blank_content_is_rejected_before_any_append() {
        let state = AppState::fake();
        let a = registered(&state, "alice").await;
        let b = registered(&state, "bob").await;
        befriend(&state, a, b).await;

        let err = send_direct(&state, a, b, "   ").await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyContent));
        assert!(fetch_direct(&state, a, b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_send_requires_membership() {
        let state = AppState::fake();
        let a = registered(&state, "alice").await;
        let c = registered(&state, "carol").await;
        let members: BTreeSet<Uuid> = [a].into_iter().collect();
        let group = state.groups.create("team", members).await.unwrap();

        let err = send_group(&state, c, group.id, "x").await.unwrap_err();
        assert!(matches!(err, ApiError::NotGroupMember));
        let err = send_group(&state, a, Uuid::new_v4(), "x").await.unwrap_err();
        assert!(matches!(err, ApiError::GroupNotFound));
    }

    #[tokio::test]
    async fn group_history_is_immutable_under_growth() {
        let state = AppState::fake();
        let a = registered(&state, "alice").await;
        let b = registered(&state, "bob").await;
        let c = registered(&state, "carol").await;
        let members: BTreeSet<Uuid> = [a, b].into_iter().collect();
        let group = state.groups.create("g", members).await.unwrap();

        let first = send_group(&state, a, group.id, "hello").await.unwrap();
        let seen_by_b = fetch_group(&state, Some(b), group.id).await.unwrap();
        assert_eq!(seen_by_b.len(), 1);
        assert_eq!(seen_by_b[0].id, first.id);

        // Adding a member and sending again leaves the first message as-is.
        state.groups.add_member(group.id, c).await.unwrap();
        send_group(&state, b, group.id, "welcome").await.unwrap();

        let history = fetch_group(&state, Some(c), group.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, first.id);
        assert_eq!(history[0].content, "hello");

        // History is also readable without naming a viewer, but the
        // group itself must exist.
        assert_eq!(fetch_group(&state, None, group.id).await.unwrap().len(), 2);
        assert!(matches!(
            fetch_group(&state, None, Uuid::new_v4()).await.unwrap_err(),
            ApiError::GroupNotFound
        ));
    }
}
