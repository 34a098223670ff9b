use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::ApiError,
    groups::{
        dto::{
            AddMemberRequest, CreateGroupRequest, GroupHistoryRequest, GroupMembersRequest,
            GroupPollQuery, SendGroupMessageRequest,
        },
        store::Group,
    },
    messages::{service, store::Message},
    state::AppState,
};

#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let members: BTreeSet<Uuid> = body.members.into_iter().collect();
    for id in &members {
        if !state.users.contains(*id).await {
            return Err(ApiError::UserNotFound);
        }
    }
    let group = state.groups.create(&body.name, members).await?;
    info!(group_id = %group.id, name = %group.name, "group created");
    Ok((StatusCode::CREATED, Json(group)))
}

#[instrument(skip(state))]
pub async fn add_member(
    State(state): State<AppState>,
    Json(body): Json<AddMemberRequest>,
) -> Result<Json<Group>, ApiError> {
    if !state.users.contains(body.member_id).await {
        return Err(ApiError::UserNotFound);
    }
    let group = state.groups.add_member(body.group_id, body.member_id).await?;
    info!(group_id = %group.id, member = %body.member_id, "member added");
    Ok(Json(group))
}

#[instrument(skip(state))]
pub async fn members(
    State(state): State<AppState>,
    Json(body): Json<GroupMembersRequest>,
) -> Result<Json<BTreeSet<Uuid>>, ApiError> {
    Ok(Json(state.groups.members(body.group_id).await?))
}

#[instrument(skip(state))]
pub async fn for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Group>>, ApiError> {
    if !state.users.contains(user_id).await {
        return Err(ApiError::UserNotFound);
    }
    Ok(Json(state.groups.list_for_user(user_id).await))
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    Json(body): Json<GroupHistoryRequest>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = service::fetch_group(&state, body.user_id, body.group_id).await?;
    Ok(Json(messages))
}

#[instrument(skip(state, body))]
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendGroupMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let message =
        service::send_group(&state, body.sender_id, body.group_id, &body.content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Long-poll for messages past the client's cursor. Returns an empty
/// batch when the configured timeout elapses with nothing new.
#[instrument(skip(state))]
pub async fn poll(
    State(state): State<AppState>,
    Query(q): Query<GroupPollQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = service::poll_group(&state, q.user_id, q.group_id, q.after).await?;
    Ok(Json(messages))
}
