//! Common test utilities and helpers.
//!
//! Spy repositories record every call they receive and can be told to fail or
//! to stall, so tests can check exactly what reached the persistence tier.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use bson::oid::ObjectId;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use umanager::db::{self, CreateLink, CreateUser, Link, LinkRepository, User, UserRepository};
use umanager::{api, AppState, Error, Result};

pub const USER_ID: &str = "8a1c5a1e-4d55-4c59-9f2b-0c3a7f5e2b11";
pub const LINK_ID: &str = "65a1f0c2b3d4e5f601234567";

/// 2024-01-02T03:04:05Z
pub fn stamp() -> DateTime<Utc> {
    Utc.timestamp_opt(1_704_164_645, 0).unwrap()
}

/// Shared behaviour knobs and call log for a spy.
#[derive(Default)]
pub struct SpyState {
    calls: Mutex<Vec<&'static str>>,
    delay: Mutex<Option<Duration>>,
    failure: Mutex<Option<String>>,
}

impl SpyState {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stall_for(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    async fn enter(&self, op: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(op);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some(message) => Err(Error::Internal(message)),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Default)]
pub struct SpyUserRepository {
    pub spy: SpyState,
    pub users: Mutex<Vec<User>>,
    pub writes: Mutex<Vec<CreateUser>>,
    pub deletes: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl UserRepository for SpyUserRepository {
    async fn create(&self, input: CreateUser) -> Result<User> {
        self.spy.enter("create").await?;
        self.writes.lock().unwrap().push(input.clone());

        let user = User {
            id: input.id,
            username: input.username,
            password: input.password,
            created_at: stamp(),
            updated_at: stamp(),
        };
        let mut users = self.users.lock().unwrap();
        users.retain(|u| u.id != user.id);
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<User> {
        self.spy.enter("find_by_id").await?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("User not found: {}", id)))
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        self.spy.enter("find_all").await?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn delete_by_user_id(&self, id: Uuid) -> Result<()> {
        self.spy.enter("delete_by_user_id").await?;
        self.deletes.lock().unwrap().push(id);
        self.users.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }
}

// ============================================================================
// Links
// ============================================================================

#[derive(Default)]
pub struct SpyLinkRepository {
    pub spy: SpyState,
    pub links: Mutex<Vec<Link>>,
    pub writes: Mutex<Vec<CreateLink>>,
    pub deletes: Mutex<Vec<ObjectId>>,
    pub user_lookups: Mutex<Vec<String>>,
}

#[async_trait]
impl LinkRepository for SpyLinkRepository {
    async fn create(&self, input: CreateLink) -> Result<Link> {
        self.spy.enter("create").await?;
        self.writes.lock().unwrap().push(input.clone());

        let link = Link {
            id: input.id,
            title: input.title,
            url: input.url,
            images: input.images,
            tags: input.tags,
            user_id: input.user_id,
            created_at: stamp(),
            updated_at: stamp(),
        };
        let mut links = self.links.lock().unwrap();
        links.retain(|l| l.id != link.id);
        links.push(link.clone());
        Ok(link)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Link> {
        self.spy.enter("find_by_id").await?;
        self.links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Link not found: {}", id.to_hex())))
    }

    async fn find_all(&self) -> Result<Vec<Link>> {
        self.spy.enter("find_all").await?;
        Ok(self.links.lock().unwrap().clone())
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Vec<Link>> {
        self.spy.enter("find_by_user_id").await?;
        self.user_lookups.lock().unwrap().push(user_id.to_string());
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: ObjectId) -> Result<()> {
        self.spy.enter("delete").await?;
        self.deletes.lock().unwrap().push(id);
        self.links.lock().unwrap().retain(|l| l.id != id);
        Ok(())
    }
}

// ============================================================================
// Servers
// ============================================================================

pub struct SpyServer {
    pub server: TestServer,
    pub users: Arc<SpyUserRepository>,
    pub links: Arc<SpyLinkRepository>,
}

/// Router over spy repositories with the given service deadline.
pub fn spy_server(timeout: Duration) -> SpyServer {
    let users = Arc::new(SpyUserRepository::default());
    let links = Arc::new(SpyLinkRepository::default());

    let state = AppState::from_repositories(users.clone(), links.clone(), timeout);
    let server = TestServer::new(api::routes().with_state(state)).expect("Failed to start test server");

    SpyServer {
        server,
        users,
        links,
    }
}

/// Router over an in-memory SQLite database.
pub async fn sqlite_server() -> TestServer {
    let pool = db::init_pool(":memory:", 1).await.expect("Failed to create test database");
    db::initialize_schema(&pool).await.expect("Failed to initialize schema");

    let state = AppState::from_repositories(
        Arc::new(db::SqliteUserRepository::new(pool.clone())),
        Arc::new(db::SqliteLinkRepository::new(pool)),
        Duration::from_secs(5),
    );
    TestServer::new(api::routes().with_state(state)).expect("Failed to start test server")
}
