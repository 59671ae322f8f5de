//! API Routes for umanager
//!
//! This module combines all API routes into a single router.
//!
//! Route structure:
//! - /users/* - User CRUD
//! - /links/* - Link CRUD and listing by owner
//! - /health - Health check
//!
//! Handlers decode the body, call the matching service and encode the
//! answer. Identifiers are not validated here; the services do that.

mod links;
pub mod status;
mod users;

use axum::Router;

use crate::AppState;

/// Build the complete API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(status::routes())
        .nest("/users", users::routes())
        .nest("/links", links::routes())
}
