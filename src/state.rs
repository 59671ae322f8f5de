//! Application state for umanager.
//!
//! Contains the shared state that is passed to all handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::db::{self, LinkRepository, SqliteLinkRepository, SqliteUserRepository, UserRepository};
use crate::services::{LinkHandler, LinkService, UserHandler, UserService};
use crate::{config, Result};

/// Application state shared across all HTTP handlers.
///
/// The HTTP tier only sees the service traits, never a repository.
#[derive(Clone)]
pub struct AppState {
    /// User service client.
    pub users: Arc<dyn UserService>,
    /// Link service client.
    pub links: Arc<dyn LinkService>,
}

impl AppState {
    /// Create the application state from the global configuration, backed by
    /// SQLite.
    pub async fn new() -> Result<Self> {
        let config = config::config();

        let pool = db::init_pool(&config.database.path, config.database.max_connections).await?;
        db::initialize_schema(&pool).await?;

        Ok(Self::from_repositories(
            Arc::new(SqliteUserRepository::new(pool.clone())),
            Arc::new(SqliteLinkRepository::new(pool)),
            config.service.timeout,
        ))
    }

    /// Wire service handlers over the given repositories.
    pub fn from_repositories(
        users: Arc<dyn UserRepository>,
        links: Arc<dyn LinkRepository>,
        timeout: Duration,
    ) -> Self {
        Self::from_services(
            Arc::new(UserHandler::new(users, timeout)),
            Arc::new(LinkHandler::new(links, timeout)),
        )
    }

    pub fn from_services(users: Arc<dyn UserService>, links: Arc<dyn LinkService>) -> Self {
        Self { users, links }
    }
}
