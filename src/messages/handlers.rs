use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use crate::{
    error::ApiError,
    messages::{
        dto::{ConversationQuery, DirectPollQuery, SendDirectRequest},
        service,
        store::Message,
    },
    state::AppState,
};

/// Timestamp is server-assigned; any timestamp in the request body is
/// ignored rather than trusted.
#[instrument(skip(state, body))]
pub async fn send(
    State(state): State<AppState>,
    Json(body): Json<SendDirectRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let message =
        service::send_direct(&state, body.sender_id, body.receiver_id, &body.content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[instrument(skip(state))]
pub async fn conversation(
    State(state): State<AppState>,
    Query(q): Query<ConversationQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = service::fetch_direct(&state, q.sender_id, q.receiver_id).await?;
    Ok(Json(messages))
}

/// Long-poll for direct messages past the client's cursor.
#[instrument(skip(state))]
pub async fn poll(
    State(state): State<AppState>,
    Query(q): Query<DirectPollQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = service::poll_direct(&state, q.user_id, q.peer_id, q.after).await?;
    Ok(Json(messages))
}
