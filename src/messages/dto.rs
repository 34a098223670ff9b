use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendDirectRequest {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationQuery {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectPollQuery {
    pub user_id: Uuid,
    pub peer_id: Uuid,
    /// Sequence number of the last message the client has seen.
    #[serde(default)]
    pub after: u64,
}
