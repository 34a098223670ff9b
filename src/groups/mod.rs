use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod store;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups/create", post(handlers::create))
        .route("/groups/add-member", post(handlers::add_member))
        .route("/groups/members", post(handlers::members))
        .route("/groups/user/:user_id", get(handlers::for_user))
        .route("/groups/messages", post(handlers::history))
        .route("/groups/send-message", post(handlers::send_message))
        .route("/groups/poll", get(handlers::poll))
}
