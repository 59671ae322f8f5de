//! Link persistence.
//!
//! Images and tags are kept as JSON arrays so their order survives storage.
//! `user_id` is an opaque reference and is not checked against `users`.

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{now, parse_column_time, DbPool};
use crate::translate::format_timestamp;
use crate::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Link record as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: ObjectId,
    pub title: String,
    pub url: String,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for writing a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLink {
    pub id: ObjectId,
    pub title: String,
    pub url: String,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub user_id: String,
}

#[derive(Debug, FromRow)]
struct LinkRow {
    id: String,
    title: String,
    url: String,
    images: String, // JSON array
    tags: String,   // JSON array
    user_id: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<LinkRow> for Link {
    type Error = Error;

    fn try_from(row: LinkRow) -> Result<Self> {
        let id = ObjectId::parse_str(&row.id)
            .map_err(|e| Error::Internal(format!("corrupt link id {:?}: {}", row.id, e)))?;

        Ok(Self {
            id,
            title: row.title,
            url: row.url,
            images: decode_list("images", &row.images)?,
            tags: decode_list("tags", &row.tags)?,
            user_id: row.user_id,
            created_at: parse_column_time("created_at", &row.created_at)?,
            updated_at: parse_column_time("updated_at", &row.updated_at)?,
        })
    }
}

fn encode_list(values: &[String]) -> Result<String> {
    serde_json::to_string(values).map_err(|e| Error::Internal(e.to_string()))
}

fn decode_list(column: &str, raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| Error::Internal(format!("corrupt {} value {:?}: {}", column, raw, e)))
}

// ============================================================================
// Port
// ============================================================================

#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Insert the link, or replace the fields of an existing link with the
    /// same id. Returns the stored record.
    async fn create(&self, input: CreateLink) -> Result<Link>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Link>;

    async fn find_all(&self) -> Result<Vec<Link>>;

    async fn find_by_user_id(&self, user_id: &str) -> Result<Vec<Link>>;

    async fn delete(&self, id: ObjectId) -> Result<()>;
}

// ============================================================================
// SQLite
// ============================================================================

const LINK_COLUMNS: &str = "id, title, url, images, tags, user_id, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteLinkRepository {
    pool: DbPool,
}

impl SqliteLinkRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for SqliteLinkRepository {
    async fn create(&self, input: CreateLink) -> Result<Link> {
        let stamp = format_timestamp(&now());

        let row = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            INSERT INTO links (id, title, url, images, tags, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                url = excluded.url,
                images = excluded.images,
                tags = excluded.tags,
                user_id = excluded.user_id,
                updated_at = excluded.updated_at
            RETURNING {}
            "#,
            LINK_COLUMNS
        ))
        .bind(input.id.to_hex())
        .bind(&input.title)
        .bind(&input.url)
        .bind(encode_list(&input.images)?)
        .bind(encode_list(&input.tags)?)
        .bind(&input.user_id)
        .bind(&stamp)
        .bind(&stamp)
        .fetch_one(&self.pool)
        .await?;

        Link::try_from(row)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Link> {
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            "SELECT {} FROM links WHERE id = ?",
            LINK_COLUMNS
        ))
        .bind(id.to_hex())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Link not found: {}", id.to_hex())))?;

        Link::try_from(row)
    }

    async fn find_all(&self) -> Result<Vec<Link>> {
        let rows = sqlx::query_as::<_, LinkRow>(&format!(
            "SELECT {} FROM links ORDER BY created_at, id",
            LINK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Link::try_from).collect()
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Vec<Link>> {
        let rows = sqlx::query_as::<_, LinkRow>(&format!(
            "SELECT {} FROM links WHERE user_id = ? ORDER BY created_at, id",
            LINK_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Link::try_from).collect()
    }

    async fn delete(&self, id: ObjectId) -> Result<()> {
        let result = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id.to_hex())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Link not found: {}", id.to_hex())));
        }

        Ok(())
    }
}
