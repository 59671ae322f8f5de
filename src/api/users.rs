//! User API endpoints.
//!
//! Routes:
//! - GET /users - List users
//! - POST /users - Create a user
//! - GET /users/:id - Get a user
//! - PUT /users/:id - Replace a user
//! - DELETE /users/:id - Delete a user
//!
//! Any service failure answers 500, including an invalid id.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::warn;

use crate::{
    error::{Error, Result},
    models::{User, UserCreate},
    proto, AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    let response = state
        .users
        .list_users(tonic::Request::new(proto::Empty {}))
        .await
        .map_err(Error::Service)?;

    let users = response
        .into_inner()
        .users
        .into_iter()
        .map(User::from)
        .collect();
    Ok(Json(users))
}

async fn create_user(State(state): State<AppState>, body: Bytes) -> Result<StatusCode> {
    let body: UserCreate = serde_json::from_slice(&body)?;

    state
        .users
        .create_user(tonic::Request::new(body.into()))
        .await
        .map_err(Error::Service)?;

    Ok(StatusCode::CREATED)
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<User>> {
    let response = state
        .users
        .get_user(tonic::Request::new(proto::GetUserRequest { id }))
        .await
        .map_err(Error::Service)?;

    Ok(Json(User::from(response.into_inner())))
}

/// The user written is the one named in the body; the path id only routes.
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode> {
    let body: UserCreate = serde_json::from_slice(&body)?;
    if body.id != id {
        warn!(path_id = %id, body_id = %body.id, "update user: path and body ids differ");
    }

    state
        .users
        .update_user(tonic::Request::new(body.into()))
        .await
        .map_err(Error::Service)?;

    Ok(StatusCode::OK)
}

async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    state
        .users
        .delete_user(tonic::Request::new(proto::DeleteUserRequest { id }))
        .await
        .map_err(Error::Service)?;

    Ok(StatusCode::NO_CONTENT)
}
