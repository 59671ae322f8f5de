//! Wire models for the HTTP API.
//!
//! These are the JSON shapes exchanged with HTTP clients. Identifiers and
//! timestamps stay strings at this tier.

mod links;
mod user;

pub use links::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Read `null` as the field's empty value.
///
/// Paired with `#[serde(default)]` on request bodies: an absent or null field
/// decodes as `""` or `[]` and is left for the service tier to judge. A value
/// of the wrong type is still a decode error.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
