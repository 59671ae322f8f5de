//! Link API endpoints.
//!
//! Routes:
//! - GET /links - List links
//! - POST /links - Create a link
//! - GET /links/:id - Get a link
//! - PUT /links/:id - Replace a link
//! - DELETE /links/:id - Delete a link
//! - GET /links/user/:user_id - List a user's links
//!
//! Service failures answer 500, except for the per-user listing which answers
//! 400.

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
    models::{Link, LinkCreate},
    proto, AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_links).post(create_link))
        .route("/user/:user_id", get(list_links_by_user))
        .route("/:id", get(get_link).put(update_link).delete(delete_link))
}

fn to_links(response: proto::ListLinkResponse) -> Vec<Link> {
    response.links.into_iter().map(Link::from).collect()
}

async fn list_links(State(state): State<AppState>) -> Result<Json<Vec<Link>>> {
    let response = state
        .links
        .list_links(tonic::Request::new(proto::Empty {}))
        .await
        .map_err(Error::Service)?;

    Ok(Json(to_links(response.into_inner())))
}

async fn create_link(State(state): State<AppState>, body: Bytes) -> Result<StatusCode> {
    let body: LinkCreate = serde_json::from_slice(&body)?;

    state
        .links
        .create_link(tonic::Request::new(body.into()))
        .await
        .map_err(Error::Service)?;

    Ok(StatusCode::CREATED)
}

async fn get_link(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Link>> {
    let response = state
        .links
        .get_link(tonic::Request::new(proto::GetLinkRequest { id }))
        .await
        .map_err(Error::Service)?;

    Ok(Json(Link::from(response.into_inner())))
}

/// The link written is the one named in the body; the path id only routes.
async fn update_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode> {
    let body: LinkCreate = serde_json::from_slice(&body)?;
    if body.id != id {
        warn!(path_id = %id, body_id = %body.id, "update link: path and body ids differ");
    }

    state
        .links
        .update_link(tonic::Request::new(body.into()))
        .await
        .map_err(Error::Service)?;

    Ok(StatusCode::OK)
}

async fn delete_link(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    state
        .links
        .delete_link(tonic::Request::new(proto::DeleteLinkRequest { id }))
        .await
        .map_err(Error::Service)?;

    Ok(StatusCode::NO_CONTENT)
}

async fn list_links_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Link>>> {
    let response = state
        .links
        .get_link_by_user_id(tonic::Request::new(proto::GetLinksByUserId { user_id }))
        .await
        .map_err(Error::Lookup)?;

    Ok(Json(to_links(response.into_inner())))
}
