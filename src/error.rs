use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Every failure a handler can return. Each variant maps to a stable
/// machine-readable code plus a human-readable message; clients must
/// dispatch on the code, never on message text.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("The e-mail {0} is currently used by another user")]
    DuplicateEmail(String),
    #[error("The username {0} is currently used by another user")]
    DuplicateUsername(String),
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Password too short")]
    PasswordTooShort,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,

    #[error("Cannot send a friend request to yourself")]
    SelfFriendRequest,
    #[error("Users are already friends")]
    AlreadyFriends,
    #[error("A friend request between these users is already pending")]
    RequestAlreadyPending,
    #[error("Friend request not found")]
    NoSuchRequest,
    #[error("Users are not friends")]
    NotFriends,

    #[error("Group name cannot be empty")]
    EmptyGroupName,
    #[error("A group must have at least one member")]
    EmptyMembership,
    #[error("Group not found")]
    GroupNotFound,
    #[error("Sender is not a member of the group")]
    NotGroupMember,

    #[error("Message content cannot be empty")]
    EmptyContent,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            ApiError::DuplicateUsername(_) => "DUPLICATE_USERNAME",
            ApiError::InvalidEmail => "INVALID_EMAIL",
            ApiError::PasswordTooShort => "PASSWORD_TOO_SHORT",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::UserNotFound => "USER_NOT_FOUND",
            ApiError::SelfFriendRequest => "SELF_FRIEND_REQUEST",
            ApiError::AlreadyFriends => "ALREADY_FRIENDS",
            ApiError::RequestAlreadyPending => "REQUEST_ALREADY_PENDING",
            ApiError::NoSuchRequest => "NO_SUCH_REQUEST",
            ApiError::NotFriends => "NOT_FRIENDS",
            ApiError::EmptyGroupName => "EMPTY_GROUP_NAME",
            ApiError::EmptyMembership => "EMPTY_MEMBERSHIP",
            ApiError::GroupNotFound => "GROUP_NOT_FOUND",
            ApiError::NotGroupMember => "NOT_GROUP_MEMBER",
            ApiError::EmptyContent => "EMPTY_CONTENT",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidEmail
            | ApiError::PasswordTooShort
            | ApiError::SelfFriendRequest
            | ApiError::EmptyGroupName
            | ApiError::EmptyMembership
            | ApiError::EmptyContent => StatusCode::BAD_REQUEST,

            ApiError::DuplicateEmail(_)
            | ApiError::DuplicateUsername(_)
            | ApiError::AlreadyFriends
            | ApiError::RequestAlreadyPending => StatusCode::CONFLICT,

            ApiError::UserNotFound | ApiError::NoSuchRequest | ApiError::GroupNotFound => {
                StatusCode::NOT_FOUND
            }

            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotFriends | ApiError::NotGroupMember => StatusCode::FORBIDDEN,

            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // The underlying cause goes to the log, not the client.
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            code: self.code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_errors_map_to_409() {
        assert_eq!(
            ApiError::DuplicateEmail("a@b.c".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::AlreadyFriends.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::RequestAlreadyPending.status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn authorization_errors_map_to_403() {
        assert_eq!(ApiError::NotFriends.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotGroupMember.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn duplicate_messages_name_the_field() {
        let e = ApiError::DuplicateEmail("taken@example.com".into());
        assert!(e.to_string().contains("e-mail"));
        let e = ApiError::DuplicateUsername("alice".into());
        assert!(e.to_string().contains("username"));
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ApiError::NoSuchRequest.code(), "NO_SUCH_REQUEST");
        assert_eq!(ApiError::EmptyContent.code(), "EMPTY_CONTENT");
        assert_eq!(ApiError::GroupNotFound.code(), "GROUP_NOT_FOUND");
    }
}
