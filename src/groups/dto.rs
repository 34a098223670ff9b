use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
    pub members: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub group_id: Uuid,
    pub member_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembersRequest {
    pub group_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupHistoryRequest {
    pub group_id: Uuid,
    /// Optional viewer. The mobile client sends the group id alone;
    /// when a viewer is named, membership is enforced.
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendGroupMessageRequest {
    pub group_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPollQuery {
    pub group_id: Uuid,
    pub user_id: Uuid,
    /// Sequence number of the last message the client has seen.
    #[serde(default)]
    pub after: u64,
}
