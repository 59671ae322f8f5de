//! Conversions between the three shapes of each entity.
//!
//! - persistence record (`db::User`, `db::Link`): typed ids and instants
//! - service message (`proto::User`, `proto::Link`): strings throughout
//! - wire DTO (`models::User`, `models::Link`): strings throughout
//!
//! Only the id and the two timestamps change type on the way; every other
//! field is copied as is. Timestamps cross the service boundary as RFC 3339
//! with second precision and a `Z` offset.

use chrono::{DateTime, ParseError, SecondsFormat, Utc};
use tonic::Status;

use crate::ids::{parse_link_id, parse_user_id};
use crate::{db, models, proto};

/// Timestamp text used on the wire and in storage columns.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Read any RFC 3339 timestamp, normalized to UTC.
pub fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, Status> {
    parse_rfc3339(raw)
        .map_err(|e| Status::invalid_argument(format!("invalid {} {:?}: {}", field, raw, e)))
}

// ============================================================================
// Users
// ============================================================================

impl From<db::User> for proto::User {
    fn from(user: db::User) -> Self {
        Self {
            id: user.id.hyphenated().to_string(),
            username: user.username,
            password: user.password,
            created_at: format_timestamp(&user.created_at),
            updated_at: format_timestamp(&user.updated_at),
        }
    }
}

impl TryFrom<proto::User> for db::User {
    type Error = Status;

    fn try_from(user: proto::User) -> Result<Self, Status> {
        Ok(Self {
            id: parse_user_id(&user.id)?,
            username: user.username,
            password: user.password,
            created_at: parse_timestamp("created_at", &user.created_at)?,
            updated_at: parse_timestamp("updated_at", &user.updated_at)?,
        })
    }
}

impl From<proto::User> for models::User {
    fn from(user: proto::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            password: user.password,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<models::User> for proto::User {
    fn from(user: models::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            password: user.password,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<models::UserCreate> for proto::CreateUserRequest {
    fn from(body: models::UserCreate) -> Self {
        Self {
            id: body.id,
            username: body.username,
            password: body.password,
        }
    }
}

impl From<models::UserCreate> for proto::UpdateUserRequest {
    fn from(body: models::UserCreate) -> Self {
        Self {
            id: body.id,
            username: body.username,
            password: body.password,
        }
    }
}

// ============================================================================
// Links
// ============================================================================

impl From<db::Link> for proto::Link {
    fn from(link: db::Link) -> Self {
        Self {
            id: link.id.to_hex(),
            title: link.title,
            url: link.url,
            images: link.images,
            tags: link.tags,
            user_id: link.user_id,
            created_at: format_timestamp(&link.created_at),
            updated_at: format_timestamp(&link.updated_at),
        }
    }
}

impl TryFrom<proto::Link> for db::Link {
    type Error = Status;

    fn try_from(link: proto::Link) -> Result<Self, Status> {
        Ok(Self {
            id: parse_link_id(&link.id)?,
            title: link.title,
            url: link.url,
            images: link.images,
            tags: link.tags,
            user_id: link.user_id,
            created_at: parse_timestamp("created_at", &link.created_at)?,
            updated_at: parse_timestamp("updated_at", &link.updated_at)?,
        })
    }
}

impl From<proto::Link> for models::Link {
    fn from(link: proto::Link) -> Self {
        Self {
            id: link.id,
            title: link.title,
            url: link.url,
            images: link.images,
            tags: link.tags,
            user_id: link.user_id,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

impl From<models::Link> for proto::Link {
    fn from(link: models::Link) -> Self {
        Self {
            id: link.id,
            title: link.title,
            url: link.url,
            images: link.images,
            tags: link.tags,
            user_id: link.user_id,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

impl From<models::LinkCreate> for proto::CreateLinkRequest {
    fn from(body: models::LinkCreate) -> Self {
        Self {
            id: body.id,
            title: body.title,
            url: body.url,
            images: body.images,
            tags: body.tags,
            user_id: body.user_id,
        }
    }
}

impl From<models::LinkCreate> for proto::UpdateLinkRequest {
    fn from(body: models::LinkCreate) -> Self {
        Self {
            id: body.id,
            title: body.title,
            url: body.url,
            images: body.images,
            tags: body.tags,
            user_id: body.user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;
    use chrono::TimeZone;
    use tonic::Code;
    use uuid::Uuid;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn sample_user() -> db::User {
        db::User {
            id: Uuid::parse_str("8a1c5a1e-4d55-4c59-9f2b-0c3a7f5e2b11").unwrap(),
            username: "alice".to_string(),
            password: "p".to_string(),
            created_at: at(1_704_164_645),
            updated_at: at(1_704_168_245),
        }
    }

    fn sample_link() -> db::Link {
        db::Link {
            id: ObjectId::parse_str("65a1f0c2b3d4e5f601234567").unwrap(),
            title: "Rust".to_string(),
            url: "https://www.rust-lang.org".to_string(),
            images: vec!["https://img.example/2.png".to_string(), "https://img.example/1.png".to_string()],
            tags: vec!["systems".to_string(), "lang".to_string()],
            user_id: "8a1c5a1e-4d55-4c59-9f2b-0c3a7f5e2b11".to_string(),
            created_at: at(1_704_164_645),
            updated_at: at(1_704_164_645),
        }
    }

    #[test]
    fn test_user_round_trip_through_every_tier() {
        let record = sample_user();

        let message = proto::User::from(record.clone());
        let dto = models::User::from(message.clone());
        let back_message = proto::User::from(dto);
        assert_eq!(back_message, message);

        let back_record = db::User::try_from(back_message).unwrap();
        assert_eq!(back_record, record);
    }

    #[test]
    fn test_link_round_trip_through_every_tier() {
        let record = sample_link();

        let message = proto::Link::from(record.clone());
        let dto = models::Link::from(message.clone());
        let back_record = db::Link::try_from(proto::Link::from(dto)).unwrap();
        assert_eq!(back_record, record);
    }

    #[test]
    fn test_record_to_message_formats() {
        let message = proto::User::from(sample_user());
        assert_eq!(message.id, "8a1c5a1e-4d55-4c59-9f2b-0c3a7f5e2b11");
        assert_eq!(message.created_at, "2024-01-02T03:04:05Z");
        assert_eq!(message.updated_at, "2024-01-02T04:04:05Z");

        let message = proto::Link::from(sample_link());
        assert_eq!(message.id, "65a1f0c2b3d4e5f601234567");
        assert_eq!(message.images[0], "https://img.example/2.png");
        assert_eq!(message.tags, vec!["systems", "lang"]);
    }

    #[test]
    fn test_offset_timestamps_are_normalized_to_utc() {
        let parsed = parse_timestamp("created_at", "2024-01-02T06:04:05+03:00").unwrap();
        assert_eq!(format_timestamp(&parsed), "2024-01-02T03:04:05Z");
    }

    #[test]
    fn test_formatted_timestamps_parse_back() {
        let stamp = at(1_704_164_645);
        let raw = format_timestamp(&stamp);
        assert_eq!(raw, "2024-01-02T03:04:05Z");
        assert_eq!(parse_rfc3339(&raw).unwrap(), stamp);
        assert!(parse_rfc3339("2024-01-02 03:04:05").is_err());
    }

    #[test]
    fn test_bad_message_fields_are_invalid_argument() {
        let mut message = proto::User::from(sample_user());
        message.created_at = "last tuesday".to_string();
        let err = db::User::try_from(message).unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        // A user id is not a link id
        let mut message = proto::Link::from(sample_link());
        message.id = "8a1c5a1e-4d55-4c59-9f2b-0c3a7f5e2b11".to_string();
        let err = db::Link::try_from(message).unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[test]
    fn test_create_body_copies_into_both_write_requests() {
        let body = models::LinkCreate {
            id: "65a1f0c2b3d4e5f601234567".to_string(),
            title: "Rust".to_string(),
            url: "https://www.rust-lang.org".to_string(),
            images: vec!["i".to_string()],
            tags: vec!["t".to_string()],
            user_id: "u".to_string(),
        };

        let create = proto::CreateLinkRequest::from(body.clone());
        let update = proto::UpdateLinkRequest::from(body);
        assert_eq!(create.id, update.id);
        assert_eq!(create.images, update.images);
        assert_eq!(create.tags, update.tags);
        assert_eq!(create.user_id, "u");
        assert_eq!(update.title, "Rust");
    }
}
