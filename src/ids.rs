//! Identifier schemes.
//!
//! Users are keyed by UUIDs and links by 12-byte ObjectIDs. Both arrive as
//! opaque strings at the service boundary and are parsed here, in one place,
//! before anything reaches a repository. A string that parses under one
//! scheme never parses under the other.

use std::fmt;

use bson::oid::ObjectId;
use tonic::Status;
use uuid::Uuid;

/// Entity kind an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    User,
    Link,
}

impl IdKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Link => "link",
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed identifier, tagged with its scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier {
    User(Uuid),
    Link(ObjectId),
}

impl Identifier {
    pub fn kind(&self) -> IdKind {
        match self {
            Self::User(_) => IdKind::User,
            Self::Link(_) => IdKind::Link,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "{}", id.hyphenated()),
            Self::Link(id) => f.write_str(&id.to_hex()),
        }
    }
}

/// Parse a wire identifier under the scheme of `kind`.
///
/// Any textual UUID form is accepted for users (hyphenated, simple, braced,
/// urn). Links need exactly 24 hex characters. Failures are
/// `InvalidArgument`.
pub fn parse_identifier(kind: IdKind, raw: &str) -> Result<Identifier, Status> {
    match kind {
        IdKind::User => parse_user_id(raw).map(Identifier::User),
        IdKind::Link => parse_link_id(raw).map(Identifier::Link),
    }
}

/// Parse a user identifier.
pub fn parse_user_id(raw: &str) -> Result<Uuid, Status> {
    Uuid::parse_str(raw).map_err(|e| invalid(IdKind::User, raw, e))
}

/// Parse a link identifier.
pub fn parse_link_id(raw: &str) -> Result<ObjectId, Status> {
    ObjectId::parse_str(raw).map_err(|e| invalid(IdKind::Link, raw, e))
}

fn invalid(kind: IdKind, raw: &str, err: impl fmt::Display) -> Status {
    Status::invalid_argument(format!("invalid {} id {:?}: {}", kind, raw, err))
}
