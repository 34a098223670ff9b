use axum::{
    extract::{Query, State},
    Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::ApiError,
    friends::dto::{Ack, FriendEntry, FriendPairRequest, UserIdQuery},
    state::AppState,
};

#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Json(body): Json<FriendPairRequest>,
) -> Result<Json<Ack>, ApiError> {
    state
        .users
        .ensure_exist([body.sender_id, body.receiver_id])
        .await?;
    state.friends.request(body.sender_id, body.receiver_id).await?;
    info!(sender = %body.sender_id, receiver = %body.receiver_id, "friend request sent");
    Ok(Json(Ack {
        code: "FRIEND_REQUEST_SENT",
        message: "Friend request sent successfully",
    }))
}

#[instrument(skip(state))]
pub async fn accept(
    State(state): State<AppState>,
    Json(body): Json<FriendPairRequest>,
) -> Result<Json<Ack>, ApiError> {
    state
        .users
        .ensure_exist([body.sender_id, body.receiver_id])
        .await?;
    state.friends.accept(body.sender_id, body.receiver_id).await?;
    info!(sender = %body.sender_id, receiver = %body.receiver_id, "friend request accepted");
    Ok(Json(Ack {
        code: "FRIEND_REQUEST_ACCEPTED",
        message: "Friend request accepted",
    }))
}

#[instrument(skip(state))]
pub async fn reject(
    State(state): State<AppState>,
    Json(body): Json<FriendPairRequest>,
) -> Result<Json<Ack>, ApiError> {
    state
        .users
        .ensure_exist([body.sender_id, body.receiver_id])
        .await?;
    state.friends.reject(body.sender_id, body.receiver_id).await;
    info!(sender = %body.sender_id, receiver = %body.receiver_id, "friend request rejected");
    Ok(Json(Ack {
        code: "FRIEND_REQUEST_REJECTED",
        message: "Friend request rejected",
    }))
}

#[instrument(skip(state))]
pub async fn pending(
    State(state): State<AppState>,
    Query(q): Query<UserIdQuery>,
) -> Result<Json<Vec<Uuid>>, ApiError> {
    if !state.users.contains(q.user_id).await {
        return Err(ApiError::UserNotFound);
    }
    Ok(Json(state.friends.list_pending_incoming(q.user_id).await))
}

/// Accepted friends with names resolved in one response.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<UserIdQuery>,
) -> Result<Json<Vec<FriendEntry>>, ApiError> {
    if !state.users.contains(q.user_id).await {
        return Err(ApiError::UserNotFound);
    }
    let mut entries = Vec::new();
    for id in state.friends.list_friends(q.user_id).await {
        // Users are never deleted, so every friend id resolves.
        let name = state.users.resolve_name(id).await?;
        entries.push(FriendEntry { id, name });
    }
    Ok(Json(entries))
}
