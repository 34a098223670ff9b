use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod store;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(handlers::register))
        .route("/users/login", post(handlers::login))
        .route("/users/me", get(handlers::me))
        .route("/users/all", get(handlers::all_users))
        .route("/users/:id/name", get(handlers::name_by_id))
        .route("/users/name/:name/id", get(handlers::id_by_name))
}
