//! Database models split into domain-specific modules.
//!
//! Each module owns its row types, request DTOs and the queries that
//! read and write them.

pub mod category;
pub mod inventory_item;
pub mod location;
pub mod purchase;
pub mod reports;
pub mod supplier;
pub mod transfer;
pub mod user;

pub use category::*;
pub use inventory_item::*;
pub use location::*;
pub use purchase::*;
pub use reports::*;
pub use supplier::*;
pub use transfer::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Deserializer for nullable columns in partial updates.
///
/// Use with `#[serde(default, deserialize_with = "...")]` on an
/// `Option<Option<T>>` field: a missing key stays `None` (leave the column
/// alone), `null` becomes `Some(None)` (clear it) and a value becomes
/// `Some(Some(v))`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
