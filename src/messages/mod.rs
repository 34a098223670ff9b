use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod service;
pub mod store;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages/send", post(handlers::send))
        .route("/messages/conversation", get(handlers::conversation))
        .route("/messages/poll", get(handlers::poll))
}
