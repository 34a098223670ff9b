use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    state::AppState,
    users::{
        dto::{LoginRequest, LoginResponse, PublicUser, RegisterRequest, UserSummary},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        store::User,
    },
};

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn public(user: User) -> PublicUser {
    PublicUser {
        id: user.id,
        name: user.name,
        email: user.email,
        created_at: user.created_at,
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.name = payload.name.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::InvalidEmail);
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::PasswordTooShort);
    }

    let hash = hash_password(&payload.password)?;
    let user = state
        .users
        .register(&payload.name, &payload.email, &hash)
        .await?;

    info!(user_id = %user.id, name = %user.name, "user registered");
    Ok((StatusCode::CREATED, Json(public(user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = state
        .users
        .find_by_email(&payload.email)
        .await
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        id: user.id,
        name: user.name,
        token,
    }))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state.users.get(user_id).await?;
    Ok(Json(public(user)))
}

/// Plain-text name lookup, kept for the mobile client.
#[instrument(skip(state))]
pub async fn name_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<String, ApiError> {
    state.users.resolve_name(id).await
}

/// Plain-text id lookup, kept for the mobile client.
#[instrument(skip(state))]
pub async fn id_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<String, ApiError> {
    Ok(state.users.resolve_id(&name).await?.to_string())
}

#[instrument(skip(state))]
pub async fn all_users(State(state): State<AppState>) -> Json<Vec<UserSummary>> {
    let users = state.users.list_all().await;
    let mut rows = Vec::with_capacity(users.len());
    for user in users {
        let friends = state.friends.list_friends(user.id).await;
        rows.push(UserSummary {
            id: user.id,
            name: user.name,
            friends,
        });
    }
    Json(rows)
}
