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
        .route("/friends/add", post(handlers::add))
        .route("/friends/accept", post(handlers::accept))
        .route("/friends/reject", post(handlers::reject))
        .route("/friends/pending", get(handlers::pending))
        .route("/friends/list", get(handlers::list))
}
