//! # Entities
//!
//! Every resource shelf stores is an [`Entity`]: an immutable record with a
//! server-assigned `id`, a natural key used for lookup, and a JSON form that is
//! validated field by field before anything is constructed.
//!
//! ## The JSON Contract
//!
//! - [`Entity::from_json`] runs the kind's [`schema`] first. If any field is
//!   missing or malformed, the call fails with
//!   [`ShelfError::InvalidInput`] naming *every* bad field, and no value is
//!   built.
//! - [`Entity::to_json`] is the exact inverse: `from_json(e.to_json()) == e`.
//!   Unset optional fields are omitted rather than written as `null`.
//!
//! ## Kinds
//!
//! | Kind | Natural key |
//! |------|-------------|
//! | [`Note`] | `id` |
//! | [`BlogPost`] | `slug` |
//! | [`FileDetails`] | `filename` |
//! | [`ViceBankUser`], [`Deposit`], [`Purchase`] | `id` |

use crate::error::{Result, ShelfError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

pub mod blog;
pub mod file;
pub mod note;
pub mod schema;
pub mod vice_bank;

pub use blog::BlogPost;
pub use file::FileDetails;
pub use note::Note;
pub use schema::{Field, FieldKind};
pub use vice_bank::{Deposit, Purchase, ViceBankUser};

pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + 'static
{
    /// Collection name, used for file stems and document trees.
    const KIND: &'static str;

    /// Human-readable name used in error messages.
    const LABEL: &'static str;

    /// JSON name of the natural key field.
    const NATURAL_KEY: &'static str;

    const SCHEMA: &'static [Field];

    fn id(&self) -> &str;

    fn key(&self) -> &str;

    fn added_at(&self) -> DateTime<Utc>;

    /// Name used by the alphabetical sort orders.
    fn name(&self) -> &str {
        self.key()
    }

    /// Fills the server-owned fields of a new payload. The id is always
    /// replaced; `dateAdded` is only filled in when the caller left it out.
    fn prepare_new(raw: &mut Map<String, Value>, id: &str, now: DateTime<Utc>) {
        raw.insert("id".to_string(), Value::String(id.to_string()));
        if raw.get("dateAdded").map_or(true, Value::is_null) {
            raw.insert("dateAdded".to_string(), Value::String(timestamp(now)));
        }
    }

    fn validate(raw: &Value) -> Vec<String> {
        schema::validate(Self::SCHEMA, raw)
    }

    fn from_json(raw: &Value) -> Result<Self> {
        let invalid = Self::validate(raw);
        if !invalid.is_empty() {
            return Err(ShelfError::invalid(Self::LABEL, invalid));
        }
        serde_json::from_value(raw.clone()).map_err(ShelfError::Serialization)
    }

    fn to_json(&self) -> Value {
        // Entities are plain structs of strings, numbers and timestamps.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// RFC 3339 with millisecond precision, the format every entity writes.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
