use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendPairRequest {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// Acknowledgement body for the friend mutations; same shape as the
/// error body so clients dispatch on `code` everywhere.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub code: &'static str,
    pub message: &'static str,
}

/// Friend entry with the name already resolved, so the client does not
/// round-trip name lookups per friend.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendEntry {
    pub id: Uuid,
    pub name: String,
}
