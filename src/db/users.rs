//! User persistence.
//!
//! `UserRepository` is the port the user service writes through;
//! `SqliteUserRepository` implements it on the shared pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{now, parse_column_time, DbPool};
use crate::translate::format_timestamp;
use crate::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// User record as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Stored exactly as supplied.
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for writing a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUser {
    pub id: Uuid,
    pub username: String,
    pub password: String,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    username: String,
    password: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = Error;

    fn try_from(row: UserRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::Internal(format!("corrupt user id {:?}: {}", row.id, e)))?;

        Ok(Self {
            id,
            username: row.username,
            password: row.password,
            created_at: parse_column_time("created_at", &row.created_at)?,
            updated_at: parse_column_time("updated_at", &row.updated_at)?,
        })
    }
}

// ============================================================================
// Port
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user, or replace the fields of an existing user with the
    /// same id. Returns the stored record.
    async fn create(&self, input: CreateUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<User>;

    async fn find_all(&self) -> Result<Vec<User>>;

    /// Remove the user keyed by `id`.
    async fn delete_by_user_id(&self, id: Uuid) -> Result<()>;
}

// ============================================================================
// SQLite
// ============================================================================

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: DbPool,
}

impl SqliteUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, input: CreateUser) -> Result<User> {
        let stamp = format_timestamp(&now());

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, password, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                password = excluded.password,
                updated_at = excluded.updated_at
            RETURNING id, username, password, created_at, updated_at
            "#,
        )
        .bind(input.id.hyphenated().to_string())
        .bind(&input.username)
        .bind(&input.password)
        .bind(&stamp)
        .bind(&stamp)
        .fetch_one(&self.pool)
        .await?;

        User::try_from(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id.hyphenated().to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", id)))?;

        User::try_from(row)
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password, created_at, updated_at
            FROM users
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn delete_by_user_id(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.hyphenated().to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("User not found: {}", id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, initialize_schema};

    async fn setup_repo() -> SqliteUserRepository {
        let pool = init_pool(":memory:", 1).await.unwrap();
        initialize_schema(&pool).await.unwrap();
        SqliteUserRepository::new(pool)
    }

    fn alice(id: Uuid) -> CreateUser {
        CreateUser {
            id,
            username: "alice".to_string(),
            password: "p".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = setup_repo().await;
        let id = Uuid::new_v4();

        let created = repo.create(alice(id)).await.unwrap();
        assert_eq!(created.id, id);
        assert_eq!(created.username, "alice");
        assert_eq!(created.password, "p");
        assert_eq!(created.created_at, created.updated_at);

        let fetched = repo.find_by_id(id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_twice_replaces_fields_and_keeps_created_at() {
        let repo = setup_repo().await;
        let id = Uuid::new_v4();

        let first = repo.create(alice(id)).await.unwrap();
        let second = repo
            .create(CreateUser {
                id,
                username: "alice2".to_string(),
                password: "q".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(second.username, "alice2");
        assert_eq!(second.password, "q");
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let repo = setup_repo().await;
        let err = repo.find_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_all_empty_then_delete() {
        let repo = setup_repo().await;
        assert!(repo.find_all().await.unwrap().is_empty());

        let id = Uuid::new_v4();
        repo.create(alice(id)).await.unwrap();
        repo.delete_by_user_id(id).await.unwrap();
        assert!(repo.find_all().await.unwrap().is_empty());

        let err = repo.delete_by_user_id(id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
